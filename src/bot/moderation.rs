//! Telegram implementation of the moderation calls.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use teloxide::types::{ChatPermissions, MessageId, ParseMode, ReplyParameters};

use super::dispatcher::ThrottledBot;
use crate::flood::ModerationClient;

/// Moderation client backed by the throttled bot.
#[derive(Clone)]
pub struct TelegramModerator {
    bot: ThrottledBot,
}

impl TelegramModerator {
    pub fn new(bot: ThrottledBot) -> Self {
        Self { bot }
    }
}

#[async_trait]
impl ModerationClient for TelegramModerator {
    async fn restrict(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        // No permissions = muted
        let mut request = self
            .bot
            .restrict_chat_member(chat_id, user_id, ChatPermissions::empty());
        if let Some(until) = until {
            request = request.until_date(until);
        }
        request.await?;
        Ok(())
    }

    async fn remove(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()> {
        let mut request = self.bot.ban_chat_member(chat_id, user_id);
        if let Some(until) = until {
            request = request.until_date(until);
        }
        request.await?;
        Ok(())
    }

    async fn reinstate(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<()> {
        self.bot
            .unban_chat_member(chat_id, user_id)
            .only_if_banned(true)
            .await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> anyhow::Result<()> {
        self.bot.delete_message(chat_id, message_id).await?;
        Ok(())
    }

    async fn notify(
        &self,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        text: String,
    ) -> anyhow::Result<()> {
        let mut request = self.bot.send_message(chat_id, text).parse_mode(ParseMode::Html);
        if let Some(message_id) = reply_to {
            request = request.reply_parameters(ReplyParameters::new(message_id));
        }
        request.await?;
        Ok(())
    }
}
