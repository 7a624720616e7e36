use serde::{Deserialize, Serialize};

/// Request published to the STT service to start recognizing for a session
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureStartMessage {
    pub session_id: String,
    pub lang: String,
    pub interim_results: bool,
    pub continuous: bool,
}

/// Request published to the STT service to stop recognizing
#[derive(Debug, Serialize, Deserialize)]
pub struct CaptureStopMessage {
    pub session_id: String,
}

/// Transcript message received from STT service
#[derive(Debug, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
}
