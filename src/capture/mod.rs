//! Speech capture devices
//!
//! A device turns speech into a stream of lifecycle events
//! (`start`, `result`, `end`, `error`) that the conversation session
//! interprets. Two bindings are provided:
//! - `ManualCaptureDevice`: events supplied by the caller
//! - `NatsCaptureDevice`: STT service reached over NATS

mod device;
mod manual;
mod nats;

pub use device::{CaptureOptions, DeviceEvent, SpeechCaptureDevice};
pub use manual::{ManualCaptureDevice, ManualDeviceHandle};
pub use nats::NatsCaptureDevice;
