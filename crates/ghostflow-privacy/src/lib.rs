//! # Ghostflow Privacy
//!
//! The on-device half of the pipeline: everything between a raw DOM
//! observation and the privacy-preserving [`SecureEvent`] that is allowed to
//! leave the device.
//!
//! - [`ElementFingerprinter`] - stable multi-factor element identity
//! - [`PiiScrubber`] - PII detection and stable token replacement
//! - [`IntentEncoder`] - deterministic intent classification and vectors
//! - [`DifferentialPrivacy`] - noise, bucketing, and irreversible hashes
//! - [`PrivacyPipeline`] - the orchestrator; one call per raw event
//!
//! [`SecureEvent`]: ghostflow_protocols::SecureEvent

pub mod dp;
pub mod fingerprint;
pub mod hash;
pub mod intent;
pub mod pipeline;
pub mod scrubber;

pub use dp::DifferentialPrivacy;
pub use fingerprint::ElementFingerprinter;
pub use intent::{IntentEncoder, IntentEncoding};
pub use pipeline::PrivacyPipeline;
pub use scrubber::{DetectedEntity, PiiKind, PiiScrubber};
