//! Differential privacy primitives: noise, bucketing, irreversible hashes.

use chrono::{DateTime, SecondsFormat, Utc};
use hmac::{Hmac, Mac};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::Sha256;

use crate::hash::fnv1a_32_hex;

type HmacSha256 = Hmac<Sha256>;

/// Laplace scale for timestamp noise, milliseconds.
const TIMESTAMP_NOISE_SCALE_MS: f64 = 30_000.0;
/// Timestamps are floored to this bucket width after noising.
const TIMESTAMP_BUCKET_MS: i64 = 300_000;
/// Session fingerprints rotate when this divisor advances (15 minutes).
const SESSION_BUCKET_MS: i64 = 900_000;
/// Randomized-response flip probability.
const FLIP_PROBABILITY: f64 = 0.10;

/// Noise, bucketing, and hashing for the privacy boundary.
///
/// Noise draws use a statistically sound PRNG; the session fingerprint's
/// inputs are caller-provided identifiers, keyed through HMAC-SHA256, so no
/// randomness is consumed on that path.
pub struct DifferentialPrivacy {
    epsilon: f64,
    rng: StdRng,
}

impl DifferentialPrivacy {
    /// Default privacy budget.
    pub const DEFAULT_EPSILON: f64 = 1.0;

    pub fn new() -> Self {
        Self::with_epsilon(Self::DEFAULT_EPSILON)
    }

    pub fn with_epsilon(epsilon: f64) -> Self {
        Self {
            epsilon,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic noise source, for tests.
    pub fn with_seed(epsilon: f64, seed: u64) -> Self {
        Self {
            epsilon,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Add Laplace noise (scale 30 s) then floor to a 5-minute boundary.
    /// Output is an ISO-8601 string at that granularity.
    pub fn anonymize_timestamp(&mut self, timestamp_ms: i64) -> String {
        let noised = timestamp_ms as f64 + self.laplace(TIMESTAMP_NOISE_SCALE_MS);
        let bucket = (noised as i64).div_euclid(TIMESTAMP_BUCKET_MS) * TIMESTAMP_BUCKET_MS;
        format_bucket(bucket)
    }

    /// Randomized response: flip the flag with probability 0.10, drawn
    /// independently per call.
    pub fn randomized_response(&mut self, flag: bool) -> bool {
        if self.rng.gen::<f64>() < FLIP_PROBABILITY {
            !flag
        } else {
            flag
        }
    }

    /// Add i.i.d. Gaussian noise (sigma = sqrt(2)/epsilon) to each
    /// dimension, re-normalize, and quantize to 4 decimals.
    pub fn perturb_vector(&mut self, vector: &[f32]) -> Vec<f32> {
        let sigma = (2.0f64).sqrt() / self.epsilon;
        let mut out: Vec<f32> = vector
            .iter()
            .map(|v| (f64::from(*v) + self.gaussian() * sigma) as f32)
            .collect();

        let norm: f32 = out.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut out {
                *v /= norm;
            }
        }
        for v in &mut out {
            *v = (*v * 10_000.0).round() / 10_000.0;
        }
        out
    }

    /// Irreversible session identifier: HMAC-SHA256 keyed by the device id
    /// over `device|user|floor(session_start/900000)`, lowercase hex.
    ///
    /// Rotates every 15 minutes because the divisor term changes.
    pub fn session_fingerprint(device_id: &str, user_id: &str, session_start_ms: i64) -> String {
        let bucket = session_start_ms.div_euclid(SESSION_BUCKET_MS);
        let message = format!("{device_id}|{user_id}|{bucket}");

        let mut mac = HmacSha256::new_from_slice(device_id.as_bytes())
            .expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// 8-hex FNV-1a over `dom_path.join(">") + ":" + tag_name`.
    pub fn structural_hash(dom_path: &[String], tag_name: &str) -> String {
        let joined = format!("{}:{}", dom_path.join(">"), tag_name);
        fnv1a_32_hex(joined.as_bytes())
    }

    /// `tag[role]@last3PathSegments`.
    pub fn element_signature(tag_name: &str, role: Option<&str>, dom_path: &[String]) -> String {
        let tail_start = dom_path.len().saturating_sub(3);
        let tail = dom_path[tail_start..].join(">");
        match role {
            Some(role) => format!("{tag_name}[{role}]@{tail}"),
            None => format!("{tag_name}@{tail}"),
        }
    }

    /// Laplace draw via the inverse CDF of a uniform.
    fn laplace(&mut self, scale: f64) -> f64 {
        let u: f64 = self.rng.gen::<f64>() - 0.5;
        -scale * u.signum() * (1.0 - 2.0 * u.abs()).ln()
    }

    /// Standard normal draw via Box-Muller.
    fn gaussian(&mut self) -> f64 {
        let u1: f64 = self.rng.gen::<f64>().max(f64::MIN_POSITIVE);
        let u2: f64 = self.rng.gen();
        (-2.0 * u1.ln()).sqrt() * (std::f64::consts::TAU * u2).cos()
    }
}

impl Default for DifferentialPrivacy {
    fn default() -> Self {
        Self::new()
    }
}

fn format_bucket(bucket_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(bucket_ms)
        .unwrap_or_else(|| DateTime::<Utc>::from_timestamp_millis(0).unwrap_or_default())
        .to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
#[path = "dp_tests.rs"]
mod tests;
