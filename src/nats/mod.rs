pub mod client;
pub mod messages;

pub use client::NatsClient;
pub use messages::{CaptureStartMessage, CaptureStopMessage, TranscriptMessage};
