//! Gateway configuration: token, API URL, delivery mode, and polling knobs.
//! Loaded from environment variables; `.env` should be loaded by the caller first.

use std::env;
use std::time::Duration;

use botgate_core::{BotError, Result};

/// Polling knobs for the `getUpdates` loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Sleep between fetch cycles.
    pub interval: Duration,
    /// Maximum updates per batch.
    pub limit: u32,
    /// Long-poll timeout passed to the platform, in seconds.
    pub timeout: u32,
    /// Update-type allow-list; `None` means the platform default.
    pub allowed_updates: Option<Vec<String>>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(1000),
            limit: 100,
            timeout: 0,
            allowed_updates: None,
        }
    }
}

/// Bot gateway configuration.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub bot_token: String,
    /// Override for the platform base URL (e.g. a local test server).
    pub api_url: Option<String>,
    /// True when updates arrive via webhook instead of polling. Polling cannot
    /// be started on a webhook-configured interface.
    pub webhook: bool,
    pub poll: PollConfig,
    pub log_file: Option<String>,
}

impl BotConfig {
    /// Loads from environment variables: `BOT_TOKEN` is required;
    /// `TELEGRAM_API_URL`, `BOT_WEBHOOK`, `POLL_INTERVAL_MS`, `POLL_LIMIT`,
    /// `POLL_TIMEOUT_S`, `ALLOWED_UPDATES` (comma-separated) and `LOG_FILE`
    /// are optional.
    pub fn from_env() -> Result<Self> {
        let bot_token =
            env::var("BOT_TOKEN").map_err(|_| BotError::Config("BOT_TOKEN not set".to_string()))?;
        let api_url = env::var("TELEGRAM_API_URL").ok();
        let webhook = env::var("BOT_WEBHOOK")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let mut poll = PollConfig::default();
        if let Ok(ms) = env::var("POLL_INTERVAL_MS") {
            let ms: u64 = ms
                .parse()
                .map_err(|_| BotError::Config(format!("Invalid POLL_INTERVAL_MS: {}", ms)))?;
            poll.interval = Duration::from_millis(ms);
        }
        if let Ok(limit) = env::var("POLL_LIMIT") {
            poll.limit = limit
                .parse()
                .map_err(|_| BotError::Config(format!("Invalid POLL_LIMIT: {}", limit)))?;
        }
        if let Ok(timeout) = env::var("POLL_TIMEOUT_S") {
            poll.timeout = timeout
                .parse()
                .map_err(|_| BotError::Config(format!("Invalid POLL_TIMEOUT_S: {}", timeout)))?;
        }
        if let Ok(allowed) = env::var("ALLOWED_UPDATES") {
            let list: Vec<String> = allowed
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
            if !list.is_empty() {
                poll.allowed_updates = Some(list);
            }
        }

        let log_file = env::var("LOG_FILE").ok();

        Ok(Self {
            bot_token,
            api_url,
            webhook,
            poll,
            log_file,
        })
    }

    /// Builds a polling config with the given token and defaults for the rest.
    pub fn with_token(bot_token: String) -> Self {
        Self {
            bot_token,
            api_url: None,
            webhook: false,
            poll: PollConfig::default(),
            log_file: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_token() {
        let config = BotConfig::with_token("test_token".to_string());
        assert_eq!(config.bot_token, "test_token");
        assert!(config.api_url.is_none());
        assert!(!config.webhook);
        assert_eq!(config.poll.limit, 100);
    }

    #[test]
    fn test_poll_defaults() {
        let poll = PollConfig::default();
        assert_eq!(poll.interval, Duration::from_millis(1000));
        assert_eq!(poll.timeout, 0);
        assert!(poll.allowed_updates.is_none());
    }
}
