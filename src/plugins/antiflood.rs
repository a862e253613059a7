//! Antiflood command handlers.
//!
//! Admin commands for viewing and changing a group's flood settings.
//! Argument parsing is kept separate from the handlers so that invalid
//! values are rejected before anything reaches the settings store.

use teloxide::prelude::*;
use teloxide::types::{ParseMode, ReplyParameters};
use tracing::info;

use crate::bot::dispatcher::{AppState, ThrottledBot};
use crate::database::{FloodAction, SettingsUpdate};
use crate::i18n::{get_text, resolve_locale};
use crate::utils::{command_args, parse_window_secs};

/// Words accepted as "disable" by /setflood and /setfloodtimer.
const OFF_WORDS: [&str; 2] = ["off", "no"];

/// Parse `/setflood <n|off|no|0>`.
///
/// On error returns the i18n key of the message to show.
pub fn parse_setflood(args: &[&str]) -> Result<SettingsUpdate, &'static str> {
    let Some(arg) = args.first() else {
        return Err("antiflood.setflood_usage");
    };
    let arg = arg.to_lowercase();

    let threshold = if OFF_WORDS.contains(&arg.as_str()) {
        0
    } else {
        arg.parse::<u32>().map_err(|_| "antiflood.setflood_invalid")?
    };

    Ok(SettingsUpdate {
        threshold: Some(threshold),
        ..Default::default()
    })
}

/// Parse `/setfloodtimer <count> <seconds>` or `/setfloodtimer [off|no]`.
pub fn parse_setfloodtimer(args: &[&str]) -> Result<SettingsUpdate, &'static str> {
    let disable = args
        .first()
        .is_none_or(|arg| OFF_WORDS.contains(&arg.to_lowercase().as_str()));
    if disable {
        return Ok(SettingsUpdate {
            window_secs: Some(0),
            ..Default::default()
        });
    }

    let [count, window] = args else {
        return Err("antiflood.timer_usage");
    };

    let count = count.parse::<u32>().map_err(|_| "antiflood.timer_invalid")?;
    let window = parse_window_secs(window).ok_or("antiflood.timer_invalid")?;

    Ok(SettingsUpdate {
        threshold: Some(count),
        window_secs: Some(window),
        ..Default::default()
    })
}

/// Parse `/floodmode <ban|mute|kick|tban|tmute>`.
pub fn parse_floodmode(args: &[&str]) -> Result<SettingsUpdate, &'static str> {
    let Some(arg) = args.first() else {
        return Err("antiflood.mode_usage");
    };
    let action = arg
        .parse::<FloodAction>()
        .map_err(|_| "antiflood.mode_invalid")?;

    Ok(SettingsUpdate {
        action: Some(action),
        ..Default::default()
    })
}

/// Parse `/clearflood <yes|no|on|off>`.
pub fn parse_clearflood(args: &[&str]) -> Result<SettingsUpdate, &'static str> {
    let delete = match args.first().map(|a| a.to_lowercase()).as_deref() {
        Some("yes" | "on") => true,
        Some("no" | "off") => false,
        _ => return Err("antiflood.clear_usage"),
    };

    Ok(SettingsUpdate {
        delete_on_breach: Some(delete),
        ..Default::default()
    })
}

async fn reply(bot: &ThrottledBot, msg: &Message, text: String) -> anyhow::Result<()> {
    bot.send_message(msg.chat.id, text)
        .parse_mode(ParseMode::Html)
        .reply_parameters(ReplyParameters::new(msg.id))
        .await?;
    Ok(())
}

/// Group-only, admin-only gate shared by every antiflood command.
///
/// Returns the caller's locale when the command may proceed.
async fn authorize(
    bot: &ThrottledBot,
    msg: &Message,
    state: &AppState,
) -> anyhow::Result<Option<String>> {
    let Some(user) = msg.from.as_ref() else {
        return Ok(None);
    };
    let locale = resolve_locale(user.language_code.as_deref());

    if !msg.chat.is_group() && !msg.chat.is_supergroup() {
        reply(bot, msg, get_text(&locale, "antiflood.error_group_only")).await?;
        return Ok(None);
    }

    if !state
        .permissions
        .is_admin(msg.chat.id, user.id)
        .await
        .unwrap_or(false)
    {
        reply(bot, msg, get_text(&locale, "antiflood.error_not_admin")).await?;
        return Ok(None);
    }

    Ok(Some(locale))
}

fn yes_no(value: bool, locale: &str) -> String {
    get_text(locale, if value { "common.yes" } else { "common.no" })
}

/// Handle /flood - show current settings.
pub async fn flood_command(bot: ThrottledBot, msg: Message, state: AppState) -> anyhow::Result<()> {
    let Some(locale) = authorize(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let settings = state.settings.get(msg.chat.id).await?;
    let text = get_text(&locale, "antiflood.settings")
        .replace("{limit}", &settings.threshold.to_string())
        .replace("{timer}", &settings.window_secs.to_string())
        .replace("{action}", settings.action.as_str())
        .replace("{delete}", &yes_no(settings.delete_on_breach, &locale));

    reply(&bot, &msg, text).await
}

/// Handle /setflood - set or disable the message limit.
pub async fn setflood_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(locale) = authorize(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let update = match parse_setflood(&command_args(msg.text().unwrap_or(""))) {
        Ok(update) => update,
        Err(key) => return reply(&bot, &msg, get_text(&locale, key)).await,
    };
    state.settings.update(msg.chat.id, update).await?;

    let threshold = update.threshold.unwrap_or_default();
    info!("Flood limit in chat {} set to {}", msg.chat.id, threshold);

    let text = if threshold == 0 {
        get_text(&locale, "antiflood.setflood_disabled")
    } else {
        get_text(&locale, "antiflood.setflood_done").replace("{limit}", &threshold.to_string())
    };
    reply(&bot, &msg, text).await
}

/// Handle /setfloodtimer - set limit and window together.
pub async fn setfloodtimer_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(locale) = authorize(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let update = match parse_setfloodtimer(&command_args(msg.text().unwrap_or(""))) {
        Ok(update) => update,
        Err(key) => return reply(&bot, &msg, get_text(&locale, key)).await,
    };
    state.settings.update(msg.chat.id, update).await?;

    let text = match (update.threshold, update.window_secs) {
        (Some(count), Some(seconds)) => {
            info!(
                "Flood timer in chat {} set to {} messages in {}s",
                msg.chat.id, count, seconds
            );
            get_text(&locale, "antiflood.timer_done")
                .replace("{count}", &count.to_string())
                .replace("{seconds}", &seconds.to_string())
        }
        _ => {
            info!("Flood timer disabled in chat {}", msg.chat.id);
            get_text(&locale, "antiflood.timer_disabled")
        }
    };
    reply(&bot, &msg, text).await
}

/// Handle /floodmode - set the flood action.
pub async fn floodmode_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(locale) = authorize(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let update = match parse_floodmode(&command_args(msg.text().unwrap_or(""))) {
        Ok(update) => update,
        Err(key) => return reply(&bot, &msg, get_text(&locale, key)).await,
    };
    state.settings.update(msg.chat.id, update).await?;

    let action = update.action.unwrap_or_default();
    info!("Flood action in chat {} set to {}", msg.chat.id, action);

    reply(
        &bot,
        &msg,
        get_text(&locale, "antiflood.mode_done").replace("{action}", action.as_str()),
    )
    .await
}

/// Handle /clearflood - toggle deleting the flood message.
pub async fn clearflood_command(
    bot: ThrottledBot,
    msg: Message,
    state: AppState,
) -> anyhow::Result<()> {
    let Some(locale) = authorize(&bot, &msg, &state).await? else {
        return Ok(());
    };

    let update = match parse_clearflood(&command_args(msg.text().unwrap_or(""))) {
        Ok(update) => update,
        Err(key) => return reply(&bot, &msg, get_text(&locale, key)).await,
    };
    state.settings.update(msg.chat.id, update).await?;

    let delete = update.delete_on_breach.unwrap_or_default();
    reply(
        &bot,
        &msg,
        get_text(&locale, "antiflood.clear_done").replace("{delete}", &yes_no(delete, &locale)),
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setflood() {
        assert_eq!(parse_setflood(&["5"]).unwrap().threshold, Some(5));
        for off in ["off", "NO", "0"] {
            assert_eq!(parse_setflood(&[off]).unwrap().threshold, Some(0));
        }
        assert_eq!(parse_setflood(&[]), Err("antiflood.setflood_usage"));
        assert_eq!(parse_setflood(&["-3"]), Err("antiflood.setflood_invalid"));
        assert_eq!(parse_setflood(&["many"]), Err("antiflood.setflood_invalid"));
    }

    #[test]
    fn test_setflood_touches_only_threshold() {
        let update = parse_setflood(&["7"]).unwrap();
        assert_eq!(update.window_secs, None);
        assert_eq!(update.action, None);
        assert_eq!(update.delete_on_breach, None);
    }

    #[test]
    fn test_setfloodtimer_sets_both() {
        let update = parse_setfloodtimer(&["10", "30s"]).unwrap();
        assert_eq!(update.threshold, Some(10));
        assert_eq!(update.window_secs, Some(30));

        let update = parse_setfloodtimer(&["4", "2m"]).unwrap();
        assert_eq!(update.window_secs, Some(120));
    }

    #[test]
    fn test_setfloodtimer_disable() {
        for args in [&[][..], &["off"][..], &["No"][..]] {
            let update = parse_setfloodtimer(args).unwrap();
            assert_eq!(update.window_secs, Some(0));
            assert_eq!(update.threshold, None);
        }
    }

    #[test]
    fn test_setfloodtimer_rejects_bad_input() {
        assert_eq!(parse_setfloodtimer(&["10"]), Err("antiflood.timer_usage"));
        assert_eq!(parse_setfloodtimer(&["10", "30", "x"]), Err("antiflood.timer_usage"));
        assert_eq!(parse_setfloodtimer(&["ten", "30"]), Err("antiflood.timer_invalid"));
        assert_eq!(parse_setfloodtimer(&["10", "soon"]), Err("antiflood.timer_invalid"));
    }

    #[test]
    fn test_floodmode() {
        assert_eq!(parse_floodmode(&["tmute"]).unwrap().action, Some(FloodAction::TimedMute));
        assert_eq!(parse_floodmode(&["Kick"]).unwrap().action, Some(FloodAction::Kick));
        assert_eq!(parse_floodmode(&[]), Err("antiflood.mode_usage"));
        assert_eq!(parse_floodmode(&["warn"]), Err("antiflood.mode_invalid"));
    }

    #[test]
    fn test_clearflood() {
        assert_eq!(parse_clearflood(&["yes"]).unwrap().delete_on_breach, Some(true));
        assert_eq!(parse_clearflood(&["ON"]).unwrap().delete_on_breach, Some(true));
        assert_eq!(parse_clearflood(&["off"]).unwrap().delete_on_breach, Some(false));
        assert_eq!(parse_clearflood(&["no"]).unwrap().delete_on_breach, Some(false));
        assert_eq!(parse_clearflood(&["maybe"]), Err("antiflood.clear_usage"));
        assert_eq!(parse_clearflood(&[]), Err("antiflood.clear_usage"));
    }

    #[test]
    fn test_error_keys_have_text() {
        for key in [
            "antiflood.setflood_usage",
            "antiflood.setflood_invalid",
            "antiflood.timer_usage",
            "antiflood.timer_invalid",
            "antiflood.mode_usage",
            "antiflood.mode_invalid",
            "antiflood.clear_usage",
        ] {
            assert_ne!(get_text("en", key), key);
        }
    }
}
