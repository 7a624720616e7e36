use super::device::{CaptureOptions, DeviceEvent, SpeechCaptureDevice};
use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Debug)]
struct ManualState {
    permission: AtomicBool,
    listening: AtomicBool,
    begins: AtomicUsize,
    stops: AtomicUsize,
}

/// Capture device whose events are supplied by the caller
///
/// Used when recognition runs elsewhere (the mobile client forwards its
/// recognizer events over HTTP) and in tests.
pub struct ManualCaptureDevice {
    state: Arc<ManualState>,
}

/// Caller side of a `ManualCaptureDevice`
#[derive(Debug, Clone)]
pub struct ManualDeviceHandle {
    state: Arc<ManualState>,
    events: mpsc::Sender<DeviceEvent>,
}

impl ManualCaptureDevice {
    /// Create a device, its handle, and the event stream the session consumes
    pub fn new(buffer: usize) -> (Self, ManualDeviceHandle, mpsc::Receiver<DeviceEvent>) {
        let state = Arc::new(ManualState {
            permission: AtomicBool::new(true),
            listening: AtomicBool::new(false),
            begins: AtomicUsize::new(0),
            stops: AtomicUsize::new(0),
        });
        let (events, rx) = mpsc::channel(buffer);

        let device = Self {
            state: Arc::clone(&state),
        };
        let handle = ManualDeviceHandle { state, events };

        (device, handle, rx)
    }
}

#[async_trait::async_trait]
impl SpeechCaptureDevice for ManualCaptureDevice {
    async fn request_permission(&mut self) -> Result<bool> {
        Ok(self.state.permission.load(Ordering::SeqCst))
    }

    async fn begin(&mut self, options: &CaptureOptions) -> Result<()> {
        debug!("Manual device begin ({})", options.lang);
        self.state.listening.store(true, Ordering::SeqCst);
        self.state.begins.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&mut self) -> Result<()> {
        debug!("Manual device stop");
        self.state.listening.store(false, Ordering::SeqCst);
        self.state.stops.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn name(&self) -> &str {
        "manual"
    }
}

impl ManualDeviceHandle {
    /// Deliver a recognizer event to the session
    pub async fn emit(&self, event: DeviceEvent) -> Result<()> {
        self.events
            .send(event)
            .await
            .context("Capture event receiver closed")
    }

    /// Answer given to the next permission request
    pub fn set_permission(&self, granted: bool) {
        self.state.permission.store(granted, Ordering::SeqCst);
    }

    /// Whether the session asked the device to listen and has not stopped it
    pub fn is_listening(&self) -> bool {
        self.state.listening.load(Ordering::SeqCst)
    }

    pub fn begin_count(&self) -> usize {
        self.state.begins.load(Ordering::SeqCst)
    }

    pub fn stop_count(&self) -> usize {
        self.state.stops.load(Ordering::SeqCst)
    }
}
