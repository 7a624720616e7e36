use super::message::{Message, MessageId, MessageKind, Sender};
use crate::capture::DeviceEvent;
use crate::reply::ReplyError;
use serde::Serialize;
use tracing::{debug, error, info, warn};

/// Greeting seeded as message 1 of every conversation
pub const DEFAULT_WELCOME: &str = "Hello! Welcome to the chat.";

/// Voice capture state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "message_id", rename_all = "lowercase")]
pub enum CaptureState {
    /// No capture in progress
    Idle,
    /// Device listening, nothing transcribed yet
    Listening,
    /// Transcript is being written into this voice message
    Captured(MessageId),
}

/// Side effect a transition asks its driver to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Fetch the next bot message from the reply source
    RequestReply,
    /// Start the capture device listening
    BeginCapture,
    /// Signal the capture device to stop
    StopCapture,
}

/// State of one chat screen: the message log and the voice capture machine
///
/// Every handler runs to completion before the next one starts, and returns
/// the effect (if any) the caller must carry out. Nothing here does I/O.
#[derive(Debug)]
pub struct ConversationSession {
    log: Vec<Message>,
    next_id: u64,
    capture: CaptureState,
    recognizing: bool,
    user_initiated: bool,
    pending_input: String,
}

impl ConversationSession {
    /// Create a session seeded with the welcome message as id 1
    pub fn new(welcome: impl Into<String>) -> Self {
        let welcome = Message::new(MessageId(1), MessageKind::Text, Sender::Remote, welcome.into());

        Self {
            log: vec![welcome],
            next_id: 2,
            capture: CaptureState::Idle,
            recognizing: false,
            user_initiated: false,
            pending_input: String::new(),
        }
    }

    /// Messages, oldest first
    pub fn messages(&self) -> &[Message] {
        &self.log
    }

    pub fn message(&self, id: MessageId) -> Option<&Message> {
        self.log.iter().find(|m| m.id() == id)
    }

    pub fn capture_state(&self) -> CaptureState {
        self.capture
    }

    /// Whether the recognizer reported it is actively listening
    pub fn is_recognizing(&self) -> bool {
        self.recognizing
    }

    pub fn pending_input(&self) -> &str {
        &self.pending_input
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.pending_input = text.into();
    }

    /// Submit whatever is in the input buffer
    pub fn submit_pending(&mut self) -> Option<Effect> {
        let text = std::mem::take(&mut self.pending_input);
        self.submit_text(&text)
    }

    /// Append a typed user message and ask for a reply
    ///
    /// Empty or whitespace-only input does nothing.
    pub fn submit_text(&mut self, text: &str) -> Option<Effect> {
        let text = text.trim();
        if text.is_empty() {
            debug!("Ignoring empty text submission");
            return None;
        }

        let id = self.append(MessageKind::Text, Sender::Local, text.to_string());
        self.pending_input.clear();
        debug!("Appended text message {}", id);

        Some(Effect::RequestReply)
    }

    /// Apply the outcome of a reply request
    ///
    /// A failed request is logged and leaves the log untouched.
    pub fn apply_reply(&mut self, reply: Result<String, ReplyError>) -> Option<MessageId> {
        match reply {
            Ok(body) => {
                let id = self.append(MessageKind::Text, Sender::Remote, body);
                debug!("Appended reply message {}", id);
                Some(id)
            }
            Err(e) => {
                error!("Failed to fetch reply: {}", e);
                None
            }
        }
    }

    /// User asked to start a voice capture
    pub fn start_capture(&mut self, permission_granted: bool) -> Option<Effect> {
        if self.capture != CaptureState::Idle {
            warn!("Capture already in progress ({:?})", self.capture);
            return None;
        }

        if !permission_granted {
            warn!("Microphone permission not granted");
            return None;
        }

        info!("Starting voice capture");
        self.capture = CaptureState::Listening;
        self.user_initiated = true;

        Some(Effect::BeginCapture)
    }

    /// User released the capture control; the state changes on `DeviceEvent::End`
    pub fn stop_capture(&self) -> Option<Effect> {
        match self.capture {
            CaptureState::Idle => {
                debug!("No capture to stop");
                None
            }
            CaptureState::Listening | CaptureState::Captured(_) => Some(Effect::StopCapture),
        }
    }

    /// Feed one device lifecycle event through the capture machine
    pub fn handle_device_event(&mut self, event: DeviceEvent) -> Option<Effect> {
        match event {
            DeviceEvent::Start => {
                if self.capture == CaptureState::Idle {
                    // Recognition began without start_capture()
                    info!("Capture started by device");
                    self.capture = CaptureState::Listening;
                    self.user_initiated = false;
                }
                self.recognizing = true;
                None
            }

            DeviceEvent::Result { transcript, is_final } => {
                self.apply_transcript(transcript.trim(), is_final);
                None
            }

            DeviceEvent::Error { code, message } => {
                if self.capture == CaptureState::Idle {
                    debug!("Ignoring device error while idle: {} {}", code, message);
                    return None;
                }
                error!("Speech recognition error: {} {}", code, message);
                self.reset_capture();
                None
            }

            DeviceEvent::End => {
                if self.capture == CaptureState::Idle {
                    debug!("Ignoring device end while idle");
                    return None;
                }
                let reply = self.user_initiated;
                info!("Voice capture ended ({:?})", self.capture);
                self.reset_capture();

                reply.then_some(Effect::RequestReply)
            }
        }
    }

    fn apply_transcript(&mut self, transcript: &str, is_final: bool) {
        if transcript.is_empty() {
            debug!("Ignoring empty transcript");
            return;
        }

        match self.capture {
            CaptureState::Idle => {
                debug!("Ignoring transcript outside a capture: {}", transcript);
            }
            CaptureState::Listening => {
                let id = self.append(MessageKind::Voice, Sender::Local, transcript.to_string());
                info!("Voice message {} created", id);
                self.capture = CaptureState::Captured(id);
            }
            CaptureState::Captured(id) => {
                if let Some(msg) = self.log.iter_mut().find(|m| m.id() == id) {
                    msg.replace_body(transcript.to_string());
                    debug!("Voice message {} updated (final={})", id, is_final);
                }
            }
        }
    }

    fn reset_capture(&mut self) {
        self.capture = CaptureState::Idle;
        self.recognizing = false;
        self.user_initiated = false;
    }

    fn append(&mut self, kind: MessageKind, sender: Sender, body: String) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.log.push(Message::new(id, kind, sender, body));
        id
    }
}

impl Default for ConversationSession {
    fn default() -> Self {
        Self::new(DEFAULT_WELCOME)
    }
}
