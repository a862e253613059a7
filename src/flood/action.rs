//! Applies breach decisions to the chat.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use teloxide::types::{ChatId, MessageId, UserId};
use tracing::{info, warn};

use super::evaluator::Breach;
use crate::database::FloodAction;

/// How long timed bans and mutes last.
pub const TIMED_ACTION_DAYS: i64 = 3;

/// Moderation calls the dispatcher needs from the chat platform.
#[async_trait]
pub trait ModerationClient: Send + Sync {
    /// Take away all posting rights, until `until` or indefinitely.
    async fn restrict(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()>;

    /// Remove the member, until `until` or permanently.
    async fn remove(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        until: Option<DateTime<Utc>>,
    ) -> anyhow::Result<()>;

    /// Lift a removal so the user may join again.
    async fn reinstate(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<()>;

    async fn delete_message(&self, chat_id: ChatId, message_id: MessageId) -> anyhow::Result<()>;

    /// Post a notice in the chat, optionally as a reply.
    async fn notify(
        &self,
        chat_id: ChatId,
        reply_to: Option<MessageId>,
        text: String,
    ) -> anyhow::Result<()>;
}

/// One platform call in a mitigation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Restrict { until: Option<DateTime<Utc>> },
    Remove { until: Option<DateTime<Utc>> },
    Reinstate,
}

/// Platform calls implementing `action`, performed at `now`.
pub fn plan(action: FloodAction, now: DateTime<Utc>) -> Vec<Step> {
    let expiry = now + chrono::Duration::days(TIMED_ACTION_DAYS);
    match action {
        FloodAction::Ban => vec![Step::Remove { until: None }],
        FloodAction::Mute => vec![Step::Restrict { until: None }],
        FloodAction::Kick => vec![Step::Remove { until: None }, Step::Reinstate],
        FloodAction::TimedBan => vec![Step::Remove {
            until: Some(expiry),
        }],
        FloodAction::TimedMute => vec![Step::Restrict {
            until: Some(expiry),
        }],
    }
}

/// The offender and the message that tipped them over.
#[derive(Debug, Clone)]
pub struct Offender {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub message_id: MessageId,
    /// Display name, already escaped for HTML
    pub display_name: String,
    pub locale: String,
}

/// What actually happened for one breach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mitigation {
    pub action: FloodAction,
    pub action_applied: bool,
    /// `None` when deletion was not requested
    pub message_deleted: Option<bool>,
}

/// Turns a [`Breach`] into moderation calls.
///
/// Every call is attempted once. Failures are logged and reported in the
/// chat, never retried.
#[derive(Clone)]
pub struct ActionDispatcher {
    client: Arc<dyn ModerationClient>,
    call_timeout: Duration,
}

impl ActionDispatcher {
    pub fn new(client: Arc<dyn ModerationClient>, call_timeout: Duration) -> Self {
        Self {
            client,
            call_timeout,
        }
    }

    pub async fn apply(&self, offender: &Offender, breach: Breach) -> Mitigation {
        let chat_id = offender.chat_id;
        let user_id = offender.user_id;

        info!(
            "Applying flood action {} to user {} in chat {} (burst of {})",
            breach.action, user_id, chat_id, breach.count
        );

        let action_result = self.run_steps(chat_id, user_id, plan(breach.action, Utc::now())).await;
        if let Err(e) = &action_result {
            warn!(
                "Failed to {} user {} in chat {}: {}",
                breach.action, user_id, chat_id, e
            );
        }

        let message_deleted = if breach.delete_on_breach {
            let deleted = self
                .call(self.client.delete_message(chat_id, offender.message_id))
                .await;
            if let Err(e) = &deleted {
                warn!(
                    "Failed to delete flood message {} in chat {}: {}",
                    offender.message_id.0, chat_id, e
                );
            }
            Some(deleted.is_ok())
        } else {
            None
        };

        let text = if action_result.is_ok() {
            crate::i18n::get_text(&offender.locale, "antiflood.breach_applied")
        } else {
            crate::i18n::get_text(&offender.locale, "antiflood.breach_failed")
        }
        .replace("{id}", &user_id.to_string())
        .replace(
            "{action}",
            &crate::i18n::get_text(&offender.locale, breach.action.past_tense_key()),
        )
        // Names are user text and may contain placeholders, so they go last
        .replace("{name}", &offender.display_name);

        let reply_to = match message_deleted {
            Some(true) => None,
            _ => Some(offender.message_id),
        };
        if let Err(e) = self.call(self.client.notify(chat_id, reply_to, text)).await {
            warn!("Failed to send flood notice in chat {}: {}", chat_id, e);
        }

        Mitigation {
            action: breach.action,
            action_applied: action_result.is_ok(),
            message_deleted,
        }
    }

    async fn run_steps(
        &self,
        chat_id: ChatId,
        user_id: UserId,
        steps: Vec<Step>,
    ) -> anyhow::Result<()> {
        for step in steps {
            match step {
                Step::Restrict { until } => {
                    self.call(self.client.restrict(chat_id, user_id, until)).await?
                }
                Step::Remove { until } => {
                    self.call(self.client.remove(chat_id, user_id, until)).await?
                }
                Step::Reinstate => self.call(self.client.reinstate(chat_id, user_id)).await?,
            }
        }
        Ok(())
    }

    async fn call<F>(&self, fut: F) -> anyhow::Result<()>
    where
        F: Future<Output = anyhow::Result<()>>,
    {
        tokio::time::timeout(self.call_timeout, fut)
            .await
            .map_err(|_| anyhow::anyhow!("platform call timed out after {:?}", self.call_timeout))?
    }
}
