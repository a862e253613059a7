//! Message dispatcher setup.
//!
//! Builds the dispatcher with the antiflood check and command handlers.

use std::sync::Arc;

use teloxide::adaptors::Throttle;
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use super::moderation::TelegramModerator;
use crate::cache::CacheRegistry;
use crate::config::FloodTuning;
use crate::database::{AntifloodRepository, Database};
use crate::events;
use crate::flood::{ActionDispatcher, FloodCounterStore, FloodEvaluator, SettingsProvider};
use crate::permissions::Permissions;
use crate::plugins;

/// Bot type with Throttle adaptor for automatic rate limiting.
pub type ThrottledBot = Throttle<Bot>;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Per-chat flood settings.
    pub settings: Arc<dyn SettingsProvider>,

    /// Flood counter and decision logic.
    pub flood: FloodEvaluator,

    /// Applies flood actions.
    pub actions: ActionDispatcher,

    /// Role checker with caching.
    pub permissions: Permissions,

    /// Bot username (without @).
    pub bot_username: String,
}

impl AppState {
    /// Create a new application state.
    pub async fn new(
        bot: ThrottledBot,
        db: &Database,
        cache: &CacheRegistry,
        counters: FloodCounterStore,
        tuning: FloodTuning,
        owner_ids: Vec<u64>,
        bot_username: String,
    ) -> anyhow::Result<Self> {
        // Permissions needs the inner Bot for API calls
        let permissions = Permissions::with_owners(bot.inner().clone(), cache, owner_ids)?;

        let repository = AntifloodRepository::new(db, cache)?;
        repository.ensure_indexes().await?;
        let settings: Arc<dyn SettingsProvider> = Arc::new(repository);

        let flood = FloodEvaluator::new(settings.clone(), counters, tuning.settings_timeout);
        let actions = ActionDispatcher::new(
            Arc::new(TelegramModerator::new(bot)),
            tuning.action_timeout,
        );

        Ok(Self {
            settings,
            flood,
            actions,
            permissions,
            bot_username,
        })
    }
}

/// Build the dispatcher with all handlers.
pub fn build_dispatcher(
    bot: ThrottledBot,
    state: AppState,
) -> Dispatcher<ThrottledBot, anyhow::Error, teloxide::dispatching::DefaultKey> {
    // The default distribution key is the chat, so one chat's updates are
    // handled in order while different chats run concurrently.
    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
}

/// Build the handler schema.
fn schema() -> UpdateHandler<anyhow::Error> {
    // Every message is counted for flooding first, then commands
    Update::filter_message()
        .inspect_async(events::antiflood::check_antiflood)
        .branch(plugins::command_handler())
}
