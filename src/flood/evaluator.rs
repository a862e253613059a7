//! Flood decision logic.
//!
//! Fixed-window counting: a burst starts with a user's first message and
//! keeps counting until a message arrives more than `window` after the
//! burst start, which begins a new burst. The window is measured from the
//! burst start, not from the previous message.

use std::sync::Arc;
use std::time::{Duration, Instant};

use teloxide::types::{ChatId, UserId};
use tracing::debug;

use super::provider::SettingsProvider;
use super::store::{BurstState, FloodCounterStore};
use crate::database::{FloodAction, FloodSettings};

/// Reasons an evaluation could not be made.
#[derive(Debug, thiserror::Error)]
pub enum FloodError {
    #[error("failed to load flood settings for chat {chat_id}: {source}")]
    Settings {
        chat_id: ChatId,
        #[source]
        source: anyhow::Error,
    },

    #[error("flood settings lookup for chat {chat_id} timed out after {timeout:?}")]
    SettingsTimeout { chat_id: ChatId, timeout: Duration },
}

/// Mitigation request produced by a breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Breach {
    pub action: FloodAction,
    pub delete_on_breach: bool,
    /// Burst size that triggered the breach
    pub count: u32,
}

/// Outcome of evaluating one message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Antiflood disabled in this chat; nothing was recorded.
    Ignore,
    /// Counted, still within the threshold.
    Continue { count: u32 },
    /// Counted, threshold exceeded.
    Breach(Breach),
}

/// Advance a burst by one message.
///
/// Starts a new burst when there is none yet, or when `window_secs > 0` and
/// more than `window_secs` whole seconds have passed since the burst began.
/// Otherwise counts the message into the current burst.
pub fn advance(current: Option<BurstState>, window_secs: u32, now: Instant) -> BurstState {
    let Some(mut burst) = current else {
        return BurstState::first(now);
    };

    if burst.is_stale(window_secs, now) {
        return BurstState::first(now);
    }

    burst.count = burst.count.saturating_add(1);
    burst
}

/// Per-message flood evaluator.
#[derive(Clone)]
pub struct FloodEvaluator {
    settings: Arc<dyn SettingsProvider>,
    counters: FloodCounterStore,
    settings_timeout: Duration,
}

impl FloodEvaluator {
    pub fn new(
        settings: Arc<dyn SettingsProvider>,
        counters: FloodCounterStore,
        settings_timeout: Duration,
    ) -> Self {
        Self {
            settings,
            counters,
            settings_timeout,
        }
    }

    /// Count one message from `user_id` in `chat_id` received at `now`.
    ///
    /// Calls for the same (chat, user) must be made in arrival order.
    pub async fn evaluate(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        now: Instant,
    ) -> Result<Decision, FloodError> {
        let settings = self.load_settings(chat_id).await?;
        Ok(self.record(chat_id, user_id, &settings, now))
    }

    /// Apply already-resolved settings to one message.
    pub fn record(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        settings: &FloodSettings,
        now: Instant,
    ) -> Decision {
        if !settings.is_enabled() {
            return Decision::Ignore;
        }

        let window_secs = settings.window_secs;
        let burst = self
            .counters
            .update(chat_id, user_id, window_secs, now, |current| {
                advance(current, window_secs, now)
            });

        if burst.count > settings.threshold {
            debug!(
                "User {} in chat {} exceeded flood limit ({} > {})",
                user_id, chat_id, burst.count, settings.threshold
            );
            return Decision::Breach(Breach {
                action: settings.action,
                delete_on_breach: settings.delete_on_breach,
                count: burst.count,
            });
        }

        Decision::Continue { count: burst.count }
    }

    async fn load_settings(&self, chat_id: ChatId) -> Result<FloodSettings, FloodError> {
        match tokio::time::timeout(self.settings_timeout, self.settings.get(chat_id)).await {
            Ok(Ok(settings)) => Ok(settings),
            Ok(Err(source)) => Err(FloodError::Settings { chat_id, source }),
            Err(_) => Err(FloodError::SettingsTimeout {
                chat_id,
                timeout: self.settings_timeout,
            }),
        }
    }
}
