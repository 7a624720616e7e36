use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Options passed to the recognizer when a capture begins
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureOptions {
    /// Recognition language (BCP-47)
    pub lang: String,
    /// Emit partial transcripts while the user is still speaking
    pub interim_results: bool,
    /// Keep listening after the first final transcript
    pub continuous: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        Self {
            lang: "en-US".to_string(),
            interim_results: true,
            continuous: false,
        }
    }
}

/// Lifecycle event emitted by a speech capture device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DeviceEvent {
    /// Recognition engine started listening
    Start,
    /// Transcript of everything heard so far in this capture
    Result {
        transcript: String,
        #[serde(default)]
        is_final: bool,
    },
    /// Recognition finished
    End,
    /// Recognition engine failure
    Error { code: String, message: String },
}

/// Speech capture device
///
/// Implementations deliver their `DeviceEvent`s on a channel handed out at
/// construction, so events can arrive whether or not the session asked for
/// a capture.
#[async_trait::async_trait]
pub trait SpeechCaptureDevice: Send {
    /// Ask for microphone access
    async fn request_permission(&mut self) -> Result<bool>;

    /// Begin listening
    async fn begin(&mut self, options: &CaptureOptions) -> Result<()>;

    /// Ask the device to stop; `DeviceEvent::End` follows asynchronously
    async fn stop(&mut self) -> Result<()>;

    /// Device name for logging
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_device_event_wire_format() {
        let event: DeviceEvent =
            serde_json::from_str(r#"{"type":"result","transcript":"hello","is_final":true}"#)
                .unwrap();
        assert_eq!(
            event,
            DeviceEvent::Result {
                transcript: "hello".to_string(),
                is_final: true
            }
        );

        let event: DeviceEvent = serde_json::from_str(r#"{"type":"end"}"#).unwrap();
        assert_eq!(event, DeviceEvent::End);

        let json = serde_json::to_string(&DeviceEvent::Error {
            code: "no-speech".to_string(),
            message: "nothing heard".to_string(),
        })
        .unwrap();
        assert!(json.contains("\"type\":\"error\""));
        assert!(json.contains("\"code\":\"no-speech\""));
    }

    #[test]
    fn test_capture_options_default() {
        let options = CaptureOptions::default();

        assert_eq!(options.lang, "en-US");
        assert!(options.interim_results, "Partial transcripts should be on by default");
        assert!(!options.continuous, "Capture should stop after one utterance");
    }
}
