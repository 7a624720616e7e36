use jonda_chat::nats::messages::{CaptureStartMessage, CaptureStopMessage, TranscriptMessage};

#[test]
fn test_capture_start_serialization() {
    let msg = CaptureStartMessage {
        session_id: "chat-1".to_string(),
        lang: "en-US".to_string(),
        interim_results: true,
        continuous: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"session_id\":\"chat-1\""));
    assert!(json.contains("\"lang\":\"en-US\""));
    assert!(json.contains("\"interim_results\":true"));
    assert!(json.contains("\"continuous\":false"));
}

#[test]
fn test_capture_stop_serialization() {
    let msg = CaptureStopMessage {
        session_id: "chat-1".to_string(),
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert_eq!(json, r#"{"session_id":"chat-1"}"#);
}

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "chat-1",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "chat-1");
    assert_eq!(msg.text, "Hello world");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.timestamp, "2025-10-27T14:30:05Z");
}

#[test]
fn test_transcript_without_confidence() {
    let json = r#"{
        "session_id": "chat-1",
        "text": "This is a partial",
        "partial": true,
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.partial);
    assert_eq!(msg.confidence, None);
}
