//! Antiflood settings repository with hot caching.
//!
//! Read on every group message, so lookups are cached per chat and the
//! cache entry is dropped whenever the chat's settings change.

use anyhow::Result;
use async_trait::async_trait;
use mongodb::bson::{doc, Document};
use mongodb::options::{IndexOptions, UpdateOptions};
use mongodb::{Collection, IndexModel};
use teloxide::types::ChatId;
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};
use crate::database::models::{FloodSettings, FloodSettingsRecord, SettingsUpdate};
use crate::database::Database;
use crate::flood::SettingsProvider;

/// Repository for per-chat antiflood settings.
pub struct AntifloodRepository {
    collection: Collection<FloodSettingsRecord>,
    cache: TypedCache<i64, FloodSettings>,
}

impl AntifloodRepository {
    pub fn new(db: &Database, cache: &CacheRegistry) -> Result<Self> {
        let settings_cache = cache.get_or_create("flood_settings", CacheConfig::flood_settings())?;

        Ok(Self {
            collection: db.collection("antiflood_settings"),
            cache: settings_cache,
        })
    }

    /// Ensure one document per chat.
    pub async fn ensure_indexes(&self) -> Result<()> {
        let index = IndexModel::builder()
            .keys(doc! { "chat_id": 1 })
            .options(IndexOptions::builder().unique(true).build())
            .build();
        self.collection.create_index(index).await?;
        Ok(())
    }

    /// Get settings, falling back to defaults for unconfigured chats.
    pub async fn get_or_default(&self, chat_id: i64) -> Result<FloodSettings> {
        if let Some(settings) = self.cache.get(&chat_id) {
            return Ok(settings);
        }

        let filter = doc! { "chat_id": chat_id };
        let settings = self
            .collection
            .find_one(filter)
            .await?
            .map(|record| record.settings())
            .unwrap_or_default();

        self.cache.insert(chat_id, settings);
        Ok(settings)
    }

    /// Upsert only the fields present in `update`.
    pub async fn apply_update(&self, chat_id: i64, update: SettingsUpdate) -> Result<()> {
        if update.is_empty() {
            return Ok(());
        }

        let filter = doc! { "chat_id": chat_id };
        let options = UpdateOptions::builder().upsert(true).build();

        self.collection
            .update_one(filter, doc! { "$set": update_document(&update) })
            .with_options(options)
            .await?;

        self.invalidate(chat_id);
        debug!("Updated antiflood settings for chat {}", chat_id);

        Ok(())
    }

    pub fn invalidate(&self, chat_id: i64) {
        self.cache.invalidate(&chat_id);
    }
}

#[async_trait]
impl SettingsProvider for AntifloodRepository {
    async fn get(&self, chat_id: ChatId) -> Result<FloodSettings> {
        self.get_or_default(chat_id.0).await
    }

    async fn update(&self, chat_id: ChatId, update: SettingsUpdate) -> Result<()> {
        self.apply_update(chat_id.0, update).await
    }
}

/// `$set` body for the supplied fields.
fn update_document(update: &SettingsUpdate) -> Document {
    let mut set = Document::new();
    if let Some(threshold) = update.threshold {
        set.insert("flood_limit", i64::from(threshold));
    }
    if let Some(window_secs) = update.window_secs {
        set.insert("flood_timer", i64::from(window_secs));
    }
    if let Some(action) = update.action {
        set.insert("flood_action", action.as_str());
    }
    if let Some(delete) = update.delete_on_breach {
        set.insert("delete_flood", delete);
    }
    set
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::models::FloodAction;

    #[test]
    fn test_update_document_sets_only_given_fields() {
        let set = update_document(&SettingsUpdate {
            threshold: Some(5),
            window_secs: Some(30),
            ..Default::default()
        });

        assert_eq!(set.get_i64("flood_limit").unwrap(), 5);
        assert_eq!(set.get_i64("flood_timer").unwrap(), 30);
        assert!(!set.contains_key("flood_action"));
        assert!(!set.contains_key("delete_flood"));
    }

    #[test]
    fn test_update_document_action_and_delete() {
        let set = update_document(&SettingsUpdate {
            action: Some(FloodAction::TimedBan),
            delete_on_breach: Some(true),
            ..Default::default()
        });

        assert_eq!(set.get_str("flood_action").unwrap(), "tban");
        assert!(set.get_bool("delete_flood").unwrap());
        assert_eq!(set.len(), 2);
    }
}
