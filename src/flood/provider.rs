//! Source of per-chat flood settings.

use async_trait::async_trait;
use teloxide::types::ChatId;

use crate::database::{FloodSettings, SettingsUpdate};

/// Read/write access to per-chat flood settings.
///
/// `get` resolves absent or partial records to [`FloodSettings::DISABLED`];
/// an `Err` means the backing store itself could not be reached.
#[async_trait]
pub trait SettingsProvider: Send + Sync {
    async fn get(&self, chat_id: ChatId) -> anyhow::Result<FloodSettings>;

    /// Merge the given fields into the chat's settings, creating the record
    /// if needed.
    async fn update(&self, chat_id: ChatId, update: SettingsUpdate) -> anyhow::Result<()>;
}
