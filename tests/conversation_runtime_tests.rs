// Integration tests for the conversation runtime
//
// These tests drive a running session through its handle, a manual capture
// device and a scripted reply source, and check the resulting message log.

use anyhow::Result;
use jonda_chat::{
    CaptureOptions, CaptureState, ConversationRuntime, ConversationSession, DeviceEvent,
    ManualCaptureDevice, ManualDeviceHandle, MessageId, MessageKind, ReplyError, ReplySource,
    Sender, SessionHandle, SessionSnapshot,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::{sleep, timeout};

/// Reply source returning queued outcomes, then a default joke
struct ScriptedReplySource {
    outcomes: Mutex<VecDeque<Result<String, ReplyError>>>,
    calls: AtomicUsize,
}

impl ScriptedReplySource {
    fn new(outcomes: Vec<Result<String, ReplyError>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ReplySource for ScriptedReplySource {
    async fn request(&self) -> Result<String, ReplyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("why did...".to_string()))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn start_session(source: Arc<ScriptedReplySource>) -> (SessionHandle, ManualDeviceHandle) {
    let (device, device_handle, events) = ManualCaptureDevice::new(32);

    let session = ConversationRuntime::spawn(
        ConversationSession::default(),
        source,
        Box::new(device),
        events,
        CaptureOptions::default(),
    );

    (session, device_handle)
}

/// Poll the session until `done` holds (device events and replies arrive asynchronously)
async fn wait_for<F>(session: &SessionHandle, done: F) -> Result<SessionSnapshot>
where
    F: Fn(&SessionSnapshot) -> bool,
{
    let snapshot = timeout(Duration::from_secs(2), async {
        loop {
            let snapshot = session.snapshot().await?;
            if done(&snapshot) {
                return Ok::<_, anyhow::Error>(snapshot);
            }
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await??;

    Ok(snapshot)
}

#[tokio::test]
async fn test_text_message_gets_reply() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, _device) = start_session(source.clone());

    session.submit_text("hi").await?;
    let snapshot = wait_for(&session, |s| s.messages.len() == 3).await?;

    let bodies: Vec<&str> = snapshot.messages.iter().map(|m| m.body()).collect();
    assert_eq!(bodies, vec!["Hello! Welcome to the chat.", "hi", "why did..."]);

    let senders: Vec<Sender> = snapshot.messages.iter().map(|m| m.sender()).collect();
    assert_eq!(senders, vec![Sender::Remote, Sender::Local, Sender::Remote]);

    let ids: Vec<MessageId> = snapshot.messages.iter().map(|m| m.id()).collect();
    assert_eq!(ids, vec![MessageId(1), MessageId(2), MessageId(3)]);
    assert_eq!(source.calls(), 1);

    Ok(())
}

#[tokio::test]
async fn test_empty_text_is_ignored() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, _device) = start_session(source.clone());

    session.submit_text("   ").await?;
    let snapshot = session.snapshot().await?;

    assert_eq!(snapshot.messages.len(), 1);
    assert_eq!(source.calls(), 0, "No reply should be requested");

    Ok(())
}

#[tokio::test]
async fn test_reply_failure_leaves_log_unchanged() -> Result<()> {
    let source = ScriptedReplySource::new(vec![Err(ReplyError::Status(500))]);
    let (session, _device) = start_session(source.clone());

    session.submit_text("hi").await?;
    timeout(Duration::from_secs(2), async {
        while source.calls() == 0 {
            sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    sleep(Duration::from_millis(100)).await;

    let snapshot = session.snapshot().await?;
    assert_eq!(snapshot.messages.len(), 2, "Failed reply must not add a message");

    // Session keeps working after the failure
    session.submit_text("again").await?;
    let snapshot = wait_for(&session, |s| s.messages.len() == 4).await?;
    assert_eq!(snapshot.messages[3].body(), "why did...");

    Ok(())
}

#[tokio::test]
async fn test_voice_capture_flow() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, device) = start_session(source.clone());

    session.start_capture().await?;
    let snapshot = session.snapshot().await?;
    assert_eq!(snapshot.capture, CaptureState::Listening);
    assert_eq!(device.begin_count(), 1);
    assert!(device.is_listening());

    device.emit(DeviceEvent::Start).await?;
    wait_for(&session, |s| s.recognizing).await?;

    device
        .emit(DeviceEvent::Result {
            transcript: "hello".to_string(),
            is_final: false,
        })
        .await?;
    let snapshot = wait_for(&session, |s| s.capture == CaptureState::Captured(MessageId(2))).await?;
    assert_eq!(snapshot.messages.len(), 2);
    assert_eq!(snapshot.messages[1].kind(), MessageKind::Voice);
    assert_eq!(snapshot.messages[1].body(), "hello");

    device
        .emit(DeviceEvent::Result {
            transcript: "hello world".to_string(),
            is_final: true,
        })
        .await?;
    let snapshot = wait_for(&session, |s| s.messages[1].body() == "hello world").await?;
    assert_eq!(snapshot.messages.len(), 2, "Transcript should replace, not append");

    session.stop_capture().await?;
    session.snapshot().await?;
    assert_eq!(device.stop_count(), 1);

    device.emit(DeviceEvent::End).await?;
    let snapshot = wait_for(&session, |s| s.messages.len() == 3).await?;
    assert_eq!(snapshot.capture, CaptureState::Idle);
    assert!(!snapshot.recognizing);
    assert_eq!(snapshot.messages[2].sender(), Sender::Remote);

    sleep(Duration::from_millis(50)).await;
    assert_eq!(source.calls(), 1, "Exactly one reply per capture");

    Ok(())
}

#[tokio::test]
async fn test_permission_denied_does_not_start_device() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, device) = start_session(source);

    device.set_permission(false);
    session.start_capture().await?;
    let snapshot = session.snapshot().await?;

    assert_eq!(snapshot.capture, CaptureState::Idle);
    assert_eq!(device.begin_count(), 0);

    Ok(())
}

#[tokio::test]
async fn test_device_started_capture_requests_no_reply() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, device) = start_session(source.clone());

    device.emit(DeviceEvent::Start).await?;
    device
        .emit(DeviceEvent::Result {
            transcript: "overheard".to_string(),
            is_final: true,
        })
        .await?;
    device.emit(DeviceEvent::End).await?;

    wait_for(&session, |s| s.messages.len() == 2 && s.capture == CaptureState::Idle).await?;
    sleep(Duration::from_millis(50)).await;

    assert_eq!(source.calls(), 0);
    assert_eq!(session.snapshot().await?.messages.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_error_then_end_requests_no_reply() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, device) = start_session(source.clone());

    session.start_capture().await?;
    device.emit(DeviceEvent::Start).await?;
    device
        .emit(DeviceEvent::Error {
            code: "no-speech".to_string(),
            message: "No speech detected".to_string(),
        })
        .await?;
    device.emit(DeviceEvent::End).await?;

    wait_for(&session, |s| s.capture == CaptureState::Idle && !s.recognizing).await?;
    sleep(Duration::from_millis(50)).await;

    assert_eq!(source.calls(), 0);
    assert_eq!(session.snapshot().await?.messages.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_each_submission_gets_its_own_reply() -> Result<()> {
    let source = ScriptedReplySource::new(vec![Ok("first".to_string()), Ok("second".to_string())]);
    let (session, _device) = start_session(source.clone());

    session.submit_text("one").await?;
    session.submit_text("two").await?;

    let snapshot = wait_for(&session, |s| s.messages.len() == 5).await?;
    let remote = snapshot
        .messages
        .iter()
        .filter(|m| m.sender() == Sender::Remote)
        .count();
    assert_eq!(remote, 3);
    assert_eq!(source.calls(), 2);

    Ok(())
}

#[tokio::test]
async fn test_closed_session_rejects_commands() -> Result<()> {
    let source = ScriptedReplySource::new(vec![]);
    let (session, _device) = start_session(source);

    session.close().await?;
    sleep(Duration::from_millis(50)).await;

    assert!(session.submit_text("anyone there?").await.is_err());
    assert!(session.snapshot().await.is_err());

    Ok(())
}
