//! Conversation management
//!
//! This module provides the chat conversation core:
//! - `Message`: one entry of the log, with monotonically increasing ids
//! - `ConversationSession`: the message log plus the voice capture state machine
//! - `ConversationRuntime`: the event loop that drives a session from user
//!   commands, capture device events and reply completions

mod message;
mod runtime;
mod session;

pub use message::{Message, MessageId, MessageKind, Sender};
pub use runtime::{ConversationRuntime, SessionClosed, SessionHandle, SessionSnapshot};
pub use session::{CaptureState, ConversationSession, Effect, DEFAULT_WELCOME};
