//! /start and /help commands.

use teloxide::prelude::*;
use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup, ParseMode};
use url::Url;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::i18n::{get_text, resolve_locale};

fn locale_of(msg: &Message) -> String {
    resolve_locale(msg.from.as_ref().and_then(|u| u.language_code.as_deref()))
}

/// Handle the /start command.
pub async fn start_handler(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let locale = locale_of(&msg);
    let mut request = bot
        .send_message(msg.chat.id, get_text(&locale, "start.text"))
        .parse_mode(ParseMode::Html);

    // Offer an "add to group" button in private chats
    if msg.chat.is_private()
        && let Ok(url) =
            format!("https://t.me/{}?startgroup=true", state.bot_username).parse::<Url>()
    {
        request = request.reply_markup(InlineKeyboardMarkup::new(vec![vec![
            InlineKeyboardButton::url("➕ Add to group", url),
        ]]));
    }

    request.await?;
    Ok(())
}

/// Handle the /help command.
pub async fn help_handler(bot: ThrottledBot, msg: Message) -> anyhow::Result<()> {
    let locale = locale_of(&msg);
    bot.send_message(msg.chat.id, get_text(&locale, "help.text"))
        .parse_mode(ParseMode::Html)
        .await?;
    Ok(())
}
