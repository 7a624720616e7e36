pub mod capture;
pub mod config;
pub mod conversation;
pub mod http;
pub mod nats;
pub mod reply;

pub use capture::{
    CaptureOptions, DeviceEvent, ManualCaptureDevice, ManualDeviceHandle, NatsCaptureDevice,
    SpeechCaptureDevice,
};
pub use config::Config;
pub use conversation::{
    CaptureState, ConversationRuntime, ConversationSession, Message, MessageId, MessageKind,
    Sender, SessionHandle, SessionSnapshot,
};
pub use http::{create_router, AppState};
pub use reply::{CannedReplySource, JokeApiReplySource, ReplyError, ReplySource};
