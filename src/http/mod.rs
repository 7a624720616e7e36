//! HTTP API for the chat screen
//!
//! The mobile client runs speech recognition on-device and forwards its
//! recognizer events; the server owns each conversation:
//! - POST /chats - Open a chat
//! - GET /chats/:id - Messages and capture state
//! - GET|POST /chats/:id/messages - Read the log / submit text
//! - POST /chats/:id/capture/{start,stop,events} - Voice capture
//! - POST /chats/:id/permission - Microphone permission answer
//! - DELETE /chats/:id - Close a chat
//! - GET /health - Health check

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::{AppState, ChatEntry};
