//! Antiflood event handler.
//!
//! Counts every group message and applies the chat's flood action when a
//! user exceeds the limit.

use std::time::Instant;

use teloxide::prelude::*;
use tracing::{debug, error};

use crate::bot::dispatcher::AppState;
use crate::flood::{Decision, Offender};
use crate::i18n::resolve_locale;
use crate::utils::display_name;

/// Group messages from an identifiable user. Posts made on behalf of a
/// channel or an anonymous admin have no user to act on.
fn flood_candidate(msg: &Message) -> Option<&teloxide::types::User> {
    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        return None;
    }
    if msg.sender_chat.is_some() {
        return None;
    }
    msg.from.as_ref()
}

/// Runs before command handling for every message.
///
/// Errors are logged and end processing of this message only.
pub async fn check_antiflood(msg: Message, state: AppState) {
    let Some(user) = flood_candidate(&msg) else {
        return;
    };

    let chat_id = msg.chat.id;
    let received = Instant::now();

    let decision = match state.flood.evaluate(chat_id, user.id, received).await {
        Ok(decision) => decision,
        Err(e) => {
            // Skip mitigation rather than guess at settings
            error!("Antiflood check skipped: {}", e);
            return;
        }
    };

    let breach = match decision {
        Decision::Ignore => return,
        Decision::Continue { count } => {
            debug!("User {} in chat {}: burst of {}", user.id, chat_id, count);
            return;
        }
        Decision::Breach(breach) => breach,
    };

    let offender = Offender {
        chat_id,
        user_id: user.id,
        message_id: msg.id,
        display_name: display_name(user),
        locale: resolve_locale(user.language_code.as_deref()),
    };

    let outcome = state.actions.apply(&offender, breach).await;
    debug!(
        "Flood mitigation in chat {} for user {}: {} applied={} deleted={:?}",
        chat_id, user.id, outcome.action, outcome.action_applied, outcome.message_deleted
    );
}
