use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a message within one conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageId(pub u64);

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the message was produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Typed text (or a bot reply)
    Text,
    /// Speech transcript from a capture session
    Voice,
}

/// Which side of the conversation sent the message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The user on this device
    Local,
    /// The bot
    Remote,
}

/// A single entry in the conversation log
///
/// Only the body of a voice message may change after creation, and only
/// through the session while its capture is in progress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    kind: MessageKind,
    body: String,
    sender: Sender,
    created_at: DateTime<Utc>,
}

impl Message {
    pub(crate) fn new(id: MessageId, kind: MessageKind, sender: Sender, body: String) -> Self {
        Self {
            id,
            kind,
            body,
            sender,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn replace_body(&mut self, body: String) {
        self.body = body;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_json_shape() {
        let msg = Message::new(MessageId(7), MessageKind::Voice, Sender::Local, "hi".into());
        let json = serde_json::to_value(&msg).unwrap();

        assert_eq!(json["id"], 7);
        assert_eq!(json["kind"], "voice");
        assert_eq!(json["sender"], "local");
        assert_eq!(json["body"], "hi");
        assert!(json["created_at"].is_string());
    }
}
