use super::device::{CaptureOptions, DeviceEvent, SpeechCaptureDevice};
use crate::nats::{NatsClient, TranscriptMessage};
use anyhow::{bail, Result};
use futures::stream::StreamExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Speech capture served by an STT service over NATS
///
/// `begin` publishes a start request and reports `Start`; transcripts for
/// this session arrive as `Result`s. A final transcript ends a
/// non-continuous capture, and `stop` ends any capture still open.
pub struct NatsCaptureDevice {
    client: Arc<NatsClient>,
    gate: Arc<CaptureGate>,
    events: mpsc::Sender<DeviceEvent>,
    listener: JoinHandle<()>,
}

impl NatsCaptureDevice {
    /// Connect and start listening for this session's transcripts
    pub async fn connect(
        url: &str,
        session_id: String,
    ) -> Result<(Self, mpsc::Receiver<DeviceEvent>)> {
        let client = Arc::new(NatsClient::connect(url, session_id).await?);
        let mut subscriber = client.subscribe_transcripts().await?;

        let (events, rx) = mpsc::channel(100);
        let gate = Arc::new(CaptureGate::new(client.session_id().to_string()));

        let listener = {
            let events = events.clone();
            let gate = Arc::clone(&gate);

            tokio::spawn(async move {
                info!("Transcript listener started");

                while let Some(msg) = subscriber.next().await {
                    let transcript = match serde_json::from_slice::<TranscriptMessage>(&msg.payload)
                    {
                        Ok(t) => t,
                        Err(e) => {
                            warn!("Failed to parse transcript message: {}", e);
                            continue;
                        }
                    };

                    for event in gate.on_transcript(transcript) {
                        if events.send(event).await.is_err() {
                            info!("Transcript listener stopped");
                            return;
                        }
                    }
                }

                info!("Transcript listener stopped");
            })
        };

        Ok((
            Self {
                client,
                gate,
                events,
                listener,
            },
            rx,
        ))
    }
}

/// Which transcripts belong to the open capture, and who closes it
///
/// Shared by the transcript listener and the device; `close` and a final
/// transcript race on one flag so a capture ends exactly once.
#[derive(Debug)]
struct CaptureGate {
    session_id: String,
    active: AtomicBool,
    continuous: AtomicBool,
}

impl CaptureGate {
    fn new(session_id: String) -> Self {
        Self {
            session_id,
            active: AtomicBool::new(false),
            continuous: AtomicBool::new(false),
        }
    }

    /// Accept transcripts from now on
    fn open(&self, continuous: bool) -> DeviceEvent {
        self.continuous.store(continuous, Ordering::SeqCst);
        self.active.store(true, Ordering::SeqCst);
        DeviceEvent::Start
    }

    /// Stop accepting transcripts without reporting an end
    fn cancel(&self) {
        self.active.store(false, Ordering::SeqCst);
    }

    /// `End` if the capture was still open
    fn close(&self) -> Option<DeviceEvent> {
        self.active
            .swap(false, Ordering::SeqCst)
            .then_some(DeviceEvent::End)
    }

    fn is_open(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Events a transcript produces for this session
    fn on_transcript(&self, transcript: TranscriptMessage) -> Vec<DeviceEvent> {
        if transcript.session_id != self.session_id {
            return Vec::new();
        }

        if !self.is_open() {
            debug!("Dropping transcript outside a capture: {}", transcript.text);
            return Vec::new();
        }

        let is_final = !transcript.partial;
        let mut events = vec![DeviceEvent::Result {
            transcript: transcript.text,
            is_final,
        }];

        if is_final && !self.continuous.load(Ordering::SeqCst) {
            events.extend(self.close());
        }

        events
    }
}

/// Queue an event for the session without waiting on it
///
/// `begin`/`stop` run on the task that drains `events`, so a full channel is
/// handed to a background send instead of awaited here.
fn deliver(events: &mpsc::Sender<DeviceEvent>, event: DeviceEvent) -> Result<()> {
    match events.try_send(event) {
        Ok(()) => Ok(()),
        Err(TrySendError::Full(event)) => {
            warn!("Capture event queue full, delivering {:?} in background", event);
            let events = events.clone();
            tokio::spawn(async move {
                if events.send(event).await.is_err() {
                    error!("Capture event receiver closed");
                }
            });
            Ok(())
        }
        Err(TrySendError::Closed(_)) => bail!("Capture event receiver closed"),
    }
}

#[async_trait::async_trait]
impl SpeechCaptureDevice for NatsCaptureDevice {
    async fn request_permission(&mut self) -> Result<bool> {
        // Recognition runs in the STT service; there is no local microphone to grant
        Ok(true)
    }

    async fn begin(&mut self, options: &CaptureOptions) -> Result<()> {
        // Open first so an early partial is not dropped
        let start = self.gate.open(options.continuous);

        if let Err(e) = self.client.publish_capture_start(options).await {
            self.gate.cancel();
            return Err(e);
        }

        deliver(&self.events, start)
    }

    async fn stop(&mut self) -> Result<()> {
        let published = self.client.publish_capture_stop().await;

        // End the capture even if the STT service never heard the stop
        if let Some(end) = self.gate.close() {
            deliver(&self.events, end)?;
        }

        published
    }

    fn name(&self) -> &str {
        "nats"
    }
}

impl Drop for NatsCaptureDevice {
    fn drop(&mut self) {
        self.listener.abort();
        if self.gate.is_open() {
            error!("Capture device dropped while a capture was open");
        }
    }
}
