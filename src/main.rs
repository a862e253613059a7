//! FloodGuard - per-chat, per-user flood protection for Telegram groups.
//!
//! ## Architecture
//!
//! - `config` - Environment configuration
//! - `database` - MongoDB settings storage
//! - `cache` - LRU-based caching with Moka
//! - `flood` - Burst counting, breach decisions, mitigation
//! - `permissions` - Admin checking with caching
//! - `bot` - Dispatcher, runtime and the Telegram moderation client
//! - `plugins` - Command handlers
//! - `events` - Per-message handlers
//! - `i18n` - User-facing strings
//! - `utils` - Utility functions

mod bot;
mod cache;
mod config;
mod database;
mod events;
mod flood;
mod i18n;
mod permissions;
mod plugins;
mod utils;

use teloxide::adaptors::throttle::Limits;
use teloxide::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

use bot::AppState;
use cache::CacheRegistry;
use config::Config;
use database::Database;
use flood::FloodCounterStore;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file first (before anything else)
    dotenvy::dotenv().ok();

    // If RUST_LOG is not set, default to "info" level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("floodguard=info,teloxide=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .init();

    info!("Starting FloodGuard...");

    let config = Config::from_env()?;
    info!("Configuration loaded successfully");
    info!("Bot mode: {:?}", config.bot_mode);

    i18n::init();

    info!("Connecting to MongoDB...");
    let db = Database::connect(&config.mongodb_uri, &config.mongodb_database).await?;
    info!("Database connected");

    let cache = CacheRegistry::new();

    // Throttle keeps us within Telegram's rate limits:
    // - 30 messages per second globally
    // - 1 message per second to the same chat
    // - 20 messages per minute to the same group
    let bot = Bot::new(&config.bot_token).throttle(Limits::default());
    info!("Bot initialized with rate limiting (Throttle)");

    let me = bot.get_me().await?;
    let bot_username = config
        .bot_username
        .clone()
        .unwrap_or_else(|| me.username().to_string());
    info!("Using bot username: @{}", bot_username);

    if config.owner_ids.is_empty() {
        info!("No owner IDs configured (OWNER_IDS is empty)");
    } else {
        info!("Bot owners: {:?}", config.owner_ids);
    }

    // Burst counters live only in memory; expired ones are swept periodically
    let counters = FloodCounterStore::new();
    tokio::spawn(
        counters
            .clone()
            .run_sweeper(config.flood.sweep_interval, config.flood.max_tracked_bursts),
    );
    info!(
        "Flood counters swept every {:?} (ceiling {} bursts)",
        config.flood.sweep_interval, config.flood.max_tracked_bursts
    );

    let state = AppState::new(
        bot.clone(),
        &db,
        &cache,
        counters,
        config.flood,
        config.owner_ids.clone(),
        bot_username,
    )
    .await?;
    info!("{:?}", cache);

    let dispatcher = bot::build_dispatcher(bot.clone(), state);
    bot::run(&config, bot, dispatcher).await
}
