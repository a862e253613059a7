//! Configuration module for floodguard.
//!
//! Loads configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context};
use serde::Deserialize;

/// Bot running mode
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BotMode {
    #[default]
    Polling,
    Webhook,
}

/// Timing knobs for flood tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodTuning {
    /// Ceiling on tracked bursts; the least recently seen go first.
    pub max_tracked_bursts: usize,
    /// How often the eviction sweep runs.
    pub sweep_interval: Duration,
    /// Upper bound on one settings lookup.
    pub settings_timeout: Duration,
    /// Upper bound on each moderation call.
    pub action_timeout: Duration,
}

impl Default for FloodTuning {
    fn default() -> Self {
        Self {
            max_tracked_bursts: 100_000,
            sweep_interval: Duration::from_secs(300),
            settings_timeout: Duration::from_secs(5),
            action_timeout: Duration::from_secs(10),
        }
    }
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    // Telegram
    pub bot_token: String,
    pub bot_mode: BotMode,
    pub webhook_url: Option<String>,
    pub webhook_port: u16,
    pub webhook_secret: Option<String>,

    /// Bot username (without @).
    /// Optional - will be fetched via getMe if not set.
    pub bot_username: Option<String>,

    /// Owner user IDs (comma-separated)
    /// These users pass every admin check.
    pub owner_ids: Vec<u64>,

    // MongoDB
    pub mongodb_uri: String,
    pub mongodb_database: String,

    pub flood: FloodTuning,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    /// Fails if `BOT_TOKEN` or `MONGODB_URI` is missing, or webhook mode
    /// is selected without `WEBHOOK_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bot_mode = match var("BOT_MODE").unwrap_or_default().to_lowercase().as_str() {
            "webhook" => BotMode::Webhook,
            _ => BotMode::Polling,
        };

        let webhook_url = var("WEBHOOK_URL").filter(|s| !s.is_empty());
        if bot_mode == BotMode::Webhook && webhook_url.is_none() {
            bail!("WEBHOOK_URL must be set when BOT_MODE is webhook");
        }

        let owner_ids = var("OWNER_IDS")
            .unwrap_or_default()
            .split(',')
            .filter_map(|s| s.trim().parse::<u64>().ok())
            .collect();

        // Strip @ if present
        let bot_username = var("BOT_USERNAME")
            .map(|s| s.trim_start_matches('@').to_string())
            .filter(|s| !s.is_empty());

        let defaults = FloodTuning::default();
        let secs = |key: &str, default: Duration| {
            Duration::from_secs(parse_or(var(key), default.as_secs()))
        };
        let flood = FloodTuning {
            max_tracked_bursts: parse_or(
                var("FLOOD_MAX_TRACKED_BURSTS"),
                defaults.max_tracked_bursts,
            ),
            sweep_interval: secs("FLOOD_SWEEP_INTERVAL_SECS", defaults.sweep_interval),
            settings_timeout: secs("FLOOD_SETTINGS_TIMEOUT_SECS", defaults.settings_timeout),
            action_timeout: secs("FLOOD_ACTION_TIMEOUT_SECS", defaults.action_timeout),
        };

        Ok(Self {
            bot_token: var("BOT_TOKEN").context("BOT_TOKEN must be set")?,
            bot_mode,
            webhook_url,
            webhook_port: parse_or(var("WEBHOOK_PORT"), 8443),
            webhook_secret: var("WEBHOOK_SECRET").filter(|s| !s.is_empty()),
            bot_username,
            owner_ids,
            mongodb_uri: var("MONGODB_URI").context("MONGODB_URI must be set")?,
            mongodb_database: var("MONGODB_DATABASE").unwrap_or_else(|| "floodguard".to_string()),
            flood,
        })
    }
}

/// Parse an optional value, keeping `default` when absent or invalid.
fn parse_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = load(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
        ])
        .unwrap();

        assert_eq!(config.bot_mode, BotMode::Polling);
        assert_eq!(config.mongodb_database, "floodguard");
        assert_eq!(config.webhook_port, 8443);
        assert!(config.owner_ids.is_empty());
        assert_eq!(config.flood, FloodTuning::default());
    }

    #[test]
    fn test_missing_token_is_an_error() {
        let err = load(&[("MONGODB_URI", "mongodb://localhost")]).unwrap_err();
        assert!(err.to_string().contains("BOT_TOKEN"));
    }

    #[test]
    fn test_webhook_requires_url() {
        let err = load(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("BOT_MODE", "Webhook"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("WEBHOOK_URL"));
    }

    #[test]
    fn test_owner_ids_username_and_tuning() {
        let config = load(&[
            ("BOT_TOKEN", "123:abc"),
            ("MONGODB_URI", "mongodb://localhost"),
            ("OWNER_IDS", "1, 2,oops,3"),
            ("BOT_USERNAME", "@floodguard_bot"),
            ("FLOOD_MAX_TRACKED_BURSTS", "5000"),
            ("FLOOD_ACTION_TIMEOUT_SECS", "soon"),
        ])
        .unwrap();

        assert_eq!(config.owner_ids, vec![1, 2, 3]);
        assert_eq!(config.bot_username.as_deref(), Some("floodguard_bot"));
        assert_eq!(config.flood.max_tracked_bursts, 5_000);
        assert_eq!(config.flood.action_timeout, Duration::from_secs(10));
    }
}
