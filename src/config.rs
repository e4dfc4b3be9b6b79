//! Configuration loading.

use std::path::Path;

use serde::Deserialize;

/// Top-level configuration, loadable from TOML with full defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub llm: LlmConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// OpenAI-compatible API root.
    pub base_url: String,
    pub model: String,
    /// Environment variable holding the API key.
    pub api_key_env: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "GHOSTFLOW_LLM_API_KEY".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Events per device per minute.
    pub per_device_rate_limit: u32,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            per_device_rate_limit: 1_000,
        }
    }
}

impl Config {
    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let raw = std::fs::read_to_string(path)?;
        Ok(toml::from_str(&raw)?)
    }

    /// The LLM API key, from the configured environment variable.
    pub fn llm_api_key(&self) -> String {
        std::env::var(&self.llm.api_key_env).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.ingest.per_device_rate_limit, 1_000);
        assert!(config.llm.base_url.contains("/v1"));
    }

    #[test]
    fn test_partial_toml_overlays_defaults() {
        let config: Config = toml::from_str(
            r#"
            [server]
            port = 9090

            [llm]
            model = "gpt-4o"
            "#,
        )
        .unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.llm.model, "gpt-4o");
        assert_eq!(config.ingest.per_device_rate_limit, 1_000);
    }
}
