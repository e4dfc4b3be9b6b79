//! # Ghostflow Transmit
//!
//! The reliable edge-to-cloud hop: an [`EventTransmitter`] owns an in-memory
//! buffer, a capped failed-batch queue with durable persistence, and the
//! per-minute send budget. Everything else interacts with it strictly
//! through `enqueue`, `flush`, `configure`, `stats`, and `shutdown`.

pub mod config;
pub mod durable;
pub mod transmitter;

pub use config::TransmitterConfig;
pub use durable::DurableQueue;
pub use transmitter::{EventTransmitter, TransmitterStats};
