use super::message::Message;
use super::session::{CaptureState, ConversationSession, Effect};
use crate::capture::{CaptureOptions, DeviceEvent, SpeechCaptureDevice};
use crate::reply::{ReplyError, ReplySource};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, warn};

/// The runtime behind a `SessionHandle` has exited
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Conversation session closed")]
pub struct SessionClosed;

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub messages: Vec<Message>,
    pub capture: CaptureState,
    pub recognizing: bool,
}

enum SessionCommand {
    SubmitText(String),
    StartCapture,
    StopCapture,
    Snapshot(oneshot::Sender<SessionSnapshot>),
    Close,
}

/// Cloneable sender side of a running conversation
#[derive(Debug, Clone)]
pub struct SessionHandle {
    commands: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub async fn submit_text(&self, text: impl Into<String>) -> Result<(), SessionClosed> {
        self.send(SessionCommand::SubmitText(text.into())).await
    }

    pub async fn start_capture(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::StartCapture).await
    }

    pub async fn stop_capture(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::StopCapture).await
    }

    pub async fn snapshot(&self) -> Result<SessionSnapshot, SessionClosed> {
        let (tx, rx) = oneshot::channel();
        self.send(SessionCommand::Snapshot(tx)).await?;
        rx.await.map_err(|_| SessionClosed)
    }

    /// End the session; replies still in flight are dropped
    pub async fn close(&self) -> Result<(), SessionClosed> {
        self.send(SessionCommand::Close).await
    }

    async fn send(&self, command: SessionCommand) -> Result<(), SessionClosed> {
        self.commands.send(command).await.map_err(|_| SessionClosed)
    }
}

/// Event loop owning one `ConversationSession`
///
/// User commands, device events and reply completions are handled one at a
/// time from a single task. Reply requests run as separate tasks and post
/// their result back, so a slow reply never holds up other events.
pub struct ConversationRuntime {
    session: ConversationSession,
    reply_source: Arc<dyn ReplySource>,
    device: Box<dyn SpeechCaptureDevice>,
    device_events: mpsc::Receiver<DeviceEvent>,
    device_open: bool,
    options: CaptureOptions,
    commands: mpsc::Receiver<SessionCommand>,
    replies_tx: mpsc::Sender<Result<String, ReplyError>>,
    replies_rx: mpsc::Receiver<Result<String, ReplyError>>,
}

impl ConversationRuntime {
    /// Spawn the event loop and return its handle
    pub fn spawn(
        session: ConversationSession,
        reply_source: Arc<dyn ReplySource>,
        device: Box<dyn SpeechCaptureDevice>,
        device_events: mpsc::Receiver<DeviceEvent>,
        options: CaptureOptions,
    ) -> SessionHandle {
        let (commands_tx, commands) = mpsc::channel(64);
        let (replies_tx, replies_rx) = mpsc::channel(64);

        let runtime = Self {
            session,
            reply_source,
            device,
            device_events,
            device_open: true,
            options,
            commands,
            replies_tx,
            replies_rx,
        };

        tokio::spawn(runtime.run());

        SessionHandle {
            commands: commands_tx,
        }
    }

    async fn run(mut self) {
        info!(
            "Conversation started (reply source: {}, device: {})",
            self.reply_source.name(),
            self.device.name()
        );

        loop {
            tokio::select! {
                command = self.commands.recv() => match command {
                    Some(SessionCommand::Close) | None => break,
                    Some(command) => self.handle_command(command).await,
                },

                event = self.device_events.recv(), if self.device_open => match event {
                    Some(event) => {
                        debug!("Device event: {:?}", event);
                        let effect = self.session.handle_device_event(event);
                        self.perform(effect).await;
                    }
                    None => {
                        warn!("Capture device event stream closed");
                        self.device_open = false;
                    }
                },

                Some(reply) = self.replies_rx.recv() => {
                    self.session.apply_reply(reply);
                }
            }
        }

        if self.session.capture_state() != CaptureState::Idle {
            if let Err(e) = self.device.stop().await {
                error!("Failed to stop capture device: {}", e);
            }
        }

        info!(
            "Conversation closed with {} messages",
            self.session.messages().len()
        );
    }

    async fn handle_command(&mut self, command: SessionCommand) {
        match command {
            SessionCommand::SubmitText(text) => {
                let effect = self.session.submit_text(&text);
                self.perform(effect).await;
            }

            SessionCommand::StartCapture => {
                if self.session.capture_state() != CaptureState::Idle {
                    warn!("Capture already in progress");
                    return;
                }

                let granted = match self.device.request_permission().await {
                    Ok(granted) => granted,
                    Err(e) => {
                        error!("Failed to request microphone permission: {}", e);
                        false
                    }
                };

                let effect = self.session.start_capture(granted);
                self.perform(effect).await;
            }

            SessionCommand::StopCapture => {
                let effect = self.session.stop_capture();
                self.perform(effect).await;
            }

            SessionCommand::Snapshot(reply) => {
                let snapshot = SessionSnapshot {
                    messages: self.session.messages().to_vec(),
                    capture: self.session.capture_state(),
                    recognizing: self.session.is_recognizing(),
                };
                // Caller may have given up waiting
                let _ = reply.send(snapshot);
            }

            SessionCommand::Close => {}
        }
    }

    async fn perform(&mut self, effect: Option<Effect>) {
        match effect {
            None => {}

            Some(Effect::RequestReply) => self.request_reply(),

            Some(Effect::BeginCapture) => {
                if let Err(e) = self.device.begin(&self.options).await {
                    error!("Failed to begin voice capture: {}", e);
                    self.session.handle_device_event(DeviceEvent::Error {
                        code: "begin-failed".to_string(),
                        message: e.to_string(),
                    });
                }
            }

            Some(Effect::StopCapture) => {
                if let Err(e) = self.device.stop().await {
                    error!("Failed to stop voice capture: {}", e);
                }
            }
        }
    }

    fn request_reply(&self) {
        let source = Arc::clone(&self.reply_source);
        let replies = self.replies_tx.clone();

        tokio::spawn(async move {
            let reply = source.request().await;
            // Session may have closed while the request was in flight
            let _ = replies.send(reply).await;
        });
    }
}
