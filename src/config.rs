use crate::capture::CaptureOptions;
use crate::conversation::DEFAULT_WELCOME;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub reply: ReplyConfig,
    pub speech: SpeechConfig,
    pub chat: ChatConfig,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "jonda-chat".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 4242,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplySourceKind {
    Joke,
    Canned,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    pub source: ReplySourceKind,
    /// Joke API endpoint
    pub url: String,
    pub timeout_secs: u64,
    /// Replies used by the canned source
    pub canned: Vec<String>,
}

impl Default for ReplyConfig {
    fn default() -> Self {
        Self {
            source: ReplySourceKind::Joke,
            url: "https://official-joke-api.appspot.com/random_joke".to_string(),
            timeout_secs: 10,
            canned: vec!["I'm only a placeholder bot, but I'm listening.".to_string()],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    /// Events injected by the caller (HTTP clients, tests)
    Manual,
    /// STT service over NATS
    Nats,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SpeechConfig {
    pub device: DeviceKind,
    pub nats_url: String,
    pub lang: String,
    pub interim_results: bool,
    pub continuous: bool,
}

impl SpeechConfig {
    pub fn capture_options(&self) -> CaptureOptions {
        CaptureOptions {
            lang: self.lang.clone(),
            interim_results: self.interim_results,
            continuous: self.continuous,
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        let options = CaptureOptions::default();
        Self {
            device: DeviceKind::Manual,
            nats_url: "nats://localhost:4222".to_string(),
            lang: options.lang,
            interim_results: options.interim_results,
            continuous: options.continuous,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    pub welcome_message: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            welcome_message: DEFAULT_WELCOME.to_string(),
        }
    }
}

impl Config {
    /// Load from `path` (extension optional) with `JONDA__SECTION__KEY` overrides.
    /// A missing file falls back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("JONDA").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
