use crate::capture::{CaptureOptions, ManualCaptureDevice, ManualDeviceHandle};
use crate::conversation::{ConversationRuntime, ConversationSession, SessionHandle};
use crate::reply::ReplySource;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A chat served over HTTP: its runtime and the device the client feeds
#[derive(Clone)]
pub struct ChatEntry {
    pub session: SessionHandle,
    pub device: ManualDeviceHandle,
}

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Open chats (chat_id → entry)
    pub chats: Arc<RwLock<HashMap<String, ChatEntry>>>,

    /// Reply source shared by every chat
    pub reply_source: Arc<dyn ReplySource>,

    /// Body of the seeded welcome message
    pub welcome_message: String,

    /// Options handed to the capture device on each capture
    pub capture_options: CaptureOptions,
}

impl AppState {
    pub fn new(
        reply_source: Arc<dyn ReplySource>,
        welcome_message: String,
        capture_options: CaptureOptions,
    ) -> Self {
        Self {
            chats: Arc::new(RwLock::new(HashMap::new())),
            reply_source,
            welcome_message,
            capture_options,
        }
    }

    /// Start a chat runtime whose capture events come from the HTTP client
    pub fn open_chat(&self) -> ChatEntry {
        let (device, device_handle, events) = ManualCaptureDevice::new(32);

        let session = ConversationRuntime::spawn(
            ConversationSession::new(self.welcome_message.clone()),
            Arc::clone(&self.reply_source),
            Box::new(device),
            events,
            self.capture_options.clone(),
        );

        ChatEntry {
            session,
            device: device_handle,
        }
    }

    pub async fn chat(&self, chat_id: &str) -> Option<ChatEntry> {
        let chats = self.chats.read().await;
        chats.get(chat_id).cloned()
    }
}
