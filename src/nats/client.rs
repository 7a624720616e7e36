use super::messages::{CaptureStartMessage, CaptureStopMessage};
use crate::capture::CaptureOptions;
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::info;

pub const CAPTURE_START_SUBJECT: &str = "stt.control.start";
pub const CAPTURE_STOP_SUBJECT: &str = "stt.control.stop";
pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";

pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully");

        Ok(Self { client, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Ask the STT service to start recognizing for this session
    pub async fn publish_capture_start(&self, options: &CaptureOptions) -> Result<()> {
        let message = CaptureStartMessage {
            session_id: self.session_id.clone(),
            lang: options.lang.clone(),
            interim_results: options.interim_results,
            continuous: options.continuous,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(CAPTURE_START_SUBJECT.to_string(), payload.into())
            .await
            .context("Failed to publish capture start")?;

        info!(
            "Published capture start to {} (lang={}, interim={})",
            CAPTURE_START_SUBJECT, options.lang, options.interim_results
        );

        Ok(())
    }

    /// Ask the STT service to stop recognizing for this session
    pub async fn publish_capture_stop(&self) -> Result<()> {
        let message = CaptureStopMessage {
            session_id: self.session_id.clone(),
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(CAPTURE_STOP_SUBJECT.to_string(), payload.into())
            .await
            .context("Failed to publish capture stop")?;

        info!("Published capture stop to {}", CAPTURE_STOP_SUBJECT);

        Ok(())
    }

    /// Subscribe to transcript messages
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        // stt.text.partial and stt.text.final; filtered by session_id in the payload
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT)
            .await
            .context("Failed to subscribe to transcripts")?;

        info!("Subscribed to {}", TRANSCRIPT_SUBJECT);

        Ok(subscriber)
    }
}
