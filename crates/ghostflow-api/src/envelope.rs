//! The response envelope.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Envelope wrapping every JSON response:
/// `{success, data?, error?{code,message}, meta{requestId,timestamp}}`.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
    pub meta: Meta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub request_id: Uuid,
    pub timestamp: DateTime<Utc>,
}

impl Envelope {
    pub fn ok(data: serde_json::Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            meta: Meta::now(),
        }
    }

    pub fn err(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(ErrorBody {
                code: code.into(),
                message: message.into(),
            }),
            meta: Meta::now(),
        }
    }
}

impl Meta {
    fn now() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope_shape() {
        let envelope = Envelope::ok(serde_json::json!({ "accepted": 3 }));
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["accepted"], 3);
        assert!(json.get("error").is_none());
        assert!(json["meta"]["requestId"].is_string());
        assert!(json["meta"]["timestamp"].is_string());
    }

    #[test]
    fn test_err_envelope_shape() {
        let envelope = Envelope::err("BATCH_TOO_LARGE", "batch exceeds 100 events");
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["success"], false);
        assert_eq!(json["error"]["code"], "BATCH_TOO_LARGE");
        assert!(json.get("data").is_none());
    }
}
