//! Bot reply sources
//!
//! A reply source produces the next bot message. It receives no conversation
//! context and is never retried; a failure surfaces as a `ReplyError`.

mod canned;
mod joke;

pub use canned::CannedReplySource;
pub use joke::JokeApiReplySource;

use crate::config::{ReplyConfig, ReplySourceKind};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Why a reply could not be produced
#[derive(Error, Debug)]
pub enum ReplyError {
    /// Transport failure (connect, timeout, decode)
    #[error("Reply request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Service answered with a non-success status
    #[error("Reply service returned status {0}")]
    Status(u16),

    /// Service answered but the reply was blank
    #[error("Reply service returned an empty reply")]
    Empty,

    /// Source has nothing to offer
    #[error("Reply source unavailable: {0}")]
    Unavailable(String),
}

/// Fetch the next bot message
#[async_trait::async_trait]
pub trait ReplySource: Send + Sync {
    async fn request(&self) -> Result<String, ReplyError>;

    /// Source name for logging
    fn name(&self) -> &str;
}

/// Build the reply source selected in configuration
pub fn from_config(config: &ReplyConfig) -> anyhow::Result<Arc<dyn ReplySource>> {
    let source: Arc<dyn ReplySource> = match config.source {
        ReplySourceKind::Joke => Arc::new(JokeApiReplySource::new(config)?),
        ReplySourceKind::Canned => Arc::new(CannedReplySource::new(config.canned.clone())),
    };

    info!("Using {} reply source", source.name());
    Ok(source)
}
