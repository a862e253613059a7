//! Member role lookups with caching.

use teloxide::prelude::*;
use teloxide::types::{ChatId, ChatMemberKind, UserId};
use tracing::debug;

use crate::cache::{CacheConfig, CacheRegistry, TypedCache};

/// A member's standing in a chat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MemberRole {
    Owner,
    Administrator,
    Member,
    Restricted,
    Left,
    Banned,
}

impl MemberRole {
    pub fn is_admin(self) -> bool {
        matches!(self, Self::Owner | Self::Administrator)
    }
}

impl From<&ChatMemberKind> for MemberRole {
    fn from(kind: &ChatMemberKind) -> Self {
        match kind {
            ChatMemberKind::Owner(_) => Self::Owner,
            ChatMemberKind::Administrator(_) => Self::Administrator,
            ChatMemberKind::Restricted(_) => Self::Restricted,
            ChatMemberKind::Left => Self::Left,
            ChatMemberKind::Banned(_) => Self::Banned,
            _ => Self::Member,
        }
    }
}

/// Cache key for role lookups.
type RoleCacheKey = (i64, u64); // (chat_id, user_id)

/// Role checker with caching support.
///
/// Bot owners (from OWNER_IDS env) pass every admin check.
#[derive(Clone)]
pub struct Permissions {
    bot: Bot,
    cache: TypedCache<RoleCacheKey, MemberRole>,
    owner_ids: Vec<u64>,
}

impl Permissions {
    pub fn with_owners(
        bot: Bot,
        cache_registry: &CacheRegistry,
        owner_ids: Vec<u64>,
    ) -> anyhow::Result<Self> {
        let cache = cache_registry.get_or_create("member_roles", CacheConfig::member_roles())?;
        Ok(Self {
            bot,
            cache,
            owner_ids,
        })
    }

    /// Check if a user is a bot owner.
    #[inline]
    pub fn is_bot_owner(&self, user_id: UserId) -> bool {
        self.owner_ids.contains(&user_id.0)
    }

    /// Look up a user's role, from cache when possible.
    pub async fn member_role(
        &self,
        chat_id: ChatId,
        user_id: UserId,
    ) -> anyhow::Result<MemberRole> {
        let cache_key = (chat_id.0, user_id.0);

        if let Some(role) = self.cache.get(&cache_key) {
            debug!("Role cache hit for user {} in chat {}", user_id, chat_id);
            return Ok(role);
        }

        debug!("Role cache miss for user {} in chat {}", user_id, chat_id);

        let member = self.bot.get_chat_member(chat_id, user_id).await?;
        let role = MemberRole::from(&member.kind);
        self.cache.insert(cache_key, role);

        Ok(role)
    }

    /// Check if a user is an administrator or the owner of the chat.
    /// Bot owners always return true.
    pub async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> anyhow::Result<bool> {
        if self.is_bot_owner(user_id) {
            return Ok(true);
        }
        Ok(self.member_role(chat_id, user_id).await?.is_admin())
    }
}
