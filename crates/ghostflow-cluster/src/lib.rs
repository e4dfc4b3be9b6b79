//! # Ghostflow Cluster
//!
//! Temporal Intent Clustering: slides windows over each session's event
//! stream, clusters them by semantic and temporal proximity, lifts each
//! surviving cluster into a named workflow candidate through the LLM port,
//! and fuses statistical and model confidence before upserting
//! [`DetectedPattern`] rows.
//!
//! [`DetectedPattern`]: ghostflow_protocols::DetectedPattern

pub mod density;
pub mod detector;
pub mod lift;
pub mod score;
pub mod window;

pub use density::{cluster_sequences, cosine, Cluster};
pub use detector::{DetectorConfig, PatternDetector};
pub use lift::LiftedPattern;
pub use window::{extract_sequences, EventSequence};
