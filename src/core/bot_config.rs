use std::fs;
use std::time::Duration;

use serde::Deserialize;

use crate::cleanup::confirmation::{DEFAULT_CONFIRMATION_THRESHOLD, DEFAULT_CONFIRMATION_TIMEOUT};
use crate::cleanup::retry::{DEFAULT_RATE_LIMIT_BACKOFF, DEFAULT_RATE_LIMIT_RETRIES};
use crate::cleanup::{CleanupSettings, ConfirmationGate, RetryPolicy, MAX_PAGE_SIZE};
use crate::error::StartupError;

#[derive(Deserialize, Debug)]
pub struct BotConfig {
    pub tokens: Tokens,
    #[serde(default)]
    pub logging: Logging,
    #[serde(default)]
    pub commands: Commands,
    #[serde(default)]
    pub cleanup: Cleanup,
}

#[derive(Deserialize, Debug)]
pub struct Tokens {
    pub discord: String,
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Logging {
    pub spec: String,
    pub directory: String,
    /// Important log lines are mirrored here when set.
    pub channel: Option<u64>,
}

impl Default for Logging {
    fn default() -> Self {
        Logging {
            spec: String::from("info"),
            directory: String::from("logs"),
            channel: None,
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Commands {
    pub prefixes: Vec<String>,
}

impl Default for Commands {
    fn default() -> Self {
        Commands {
            prefixes: vec![String::from("!")],
        }
    }
}

#[derive(Deserialize, Debug)]
#[serde(default)]
pub struct Cleanup {
    pub confirmation_threshold: usize,
    pub confirmation_timeout_secs: u64,
    pub page_size: u64,
    pub sequential_delay_ms: u64,
    pub rate_limit_retries: u32,
    pub rate_limit_backoff_ms: u64,
    pub audit_log: String,
}

impl Default for Cleanup {
    fn default() -> Self {
        Cleanup {
            confirmation_threshold: DEFAULT_CONFIRMATION_THRESHOLD,
            confirmation_timeout_secs: DEFAULT_CONFIRMATION_TIMEOUT.as_secs(),
            page_size: MAX_PAGE_SIZE,
            sequential_delay_ms: 1000,
            rate_limit_retries: DEFAULT_RATE_LIMIT_RETRIES,
            rate_limit_backoff_ms: DEFAULT_RATE_LIMIT_BACKOFF.as_millis() as u64,
            audit_log: String::from("audit.jsonl"),
        }
    }
}

impl Cleanup {
    pub fn settings(&self) -> CleanupSettings {
        CleanupSettings {
            confirmation: ConfirmationGate::new(
                self.confirmation_threshold,
                // the wait has to end at some point
                Duration::from_secs(self.confirmation_timeout_secs.max(1)),
            ),
            page_size: self.page_size.max(1).min(MAX_PAGE_SIZE),
            sequential_delay: Duration::from_millis(self.sequential_delay_ms),
            retry: RetryPolicy {
                retries: self.rate_limit_retries,
                backoff: Duration::from_millis(self.rate_limit_backoff_ms),
            },
        }
    }
}

impl BotConfig {
    pub fn new(filename: &str) -> Result<Self, StartupError> {
        let config_file = fs::read_to_string(filename).map_err(|_| StartupError::NoConfig)?;
        BotConfig::parse(&config_file)
    }

    pub fn parse(raw: &str) -> Result<Self, StartupError> {
        toml::from_str(raw).map_err(StartupError::InvalidConfig)
    }
}
