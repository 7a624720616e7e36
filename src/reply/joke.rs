use super::{ReplyError, ReplySource};
use crate::config::ReplyConfig;
use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

/// Joke returned by the joke API
#[derive(Debug, Deserialize)]
struct Joke {
    setup: String,
    punchline: String,
}

impl Joke {
    fn into_reply(self) -> String {
        format!("{}\n{}", self.setup.trim(), self.punchline.trim())
    }
}

/// Placeholder bot: answers every message with a random joke
pub struct JokeApiReplySource {
    client: Client,
    url: String,
}

impl JokeApiReplySource {
    pub fn new(config: &ReplyConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build reply HTTP client")?;

        info!("Joke reply source using {}", config.url);

        Ok(Self {
            client,
            url: config.url.clone(),
        })
    }
}

#[async_trait::async_trait]
impl ReplySource for JokeApiReplySource {
    async fn request(&self) -> Result<String, ReplyError> {
        let response = self
            .client
            .get(&self.url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ReplyError::Status(status.as_u16()));
        }

        let joke: Joke = response.json().await?;
        if joke.setup.trim().is_empty() && joke.punchline.trim().is_empty() {
            return Err(ReplyError::Empty);
        }

        debug!("Received joke: {}", joke.setup);
        Ok(joke.into_reply())
    }

    fn name(&self) -> &str {
        "joke-api"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joke_reply_format() {
        let joke: Joke = serde_json::from_str(
            r#"{"type":"general","setup":"Why did the chicken cross the road?","punchline":"To get to the other side.","id":1}"#,
        )
        .unwrap();

        assert_eq!(
            joke.into_reply(),
            "Why did the chicken cross the road?\nTo get to the other side."
        );
    }
}
