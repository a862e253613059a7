//! Antiflood configuration models.

use std::fmt;
use std::str::FromStr;

use mongodb::bson::Bson;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Deserializer, Serialize};

/// Mitigation applied when a user breaches the flood threshold.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FloodAction {
    /// Ban permanently
    #[serde(rename = "ban")]
    Ban,
    /// Restrict posting indefinitely
    #[serde(rename = "mute")]
    Mute,
    /// Ban then unban (user can rejoin)
    #[serde(rename = "kick")]
    Kick,
    /// Ban for a fixed period
    #[serde(rename = "tban")]
    TimedBan,
    /// Restrict posting for a fixed period
    #[serde(rename = "tmute")]
    TimedMute,
}

impl Default for FloodAction {
    fn default() -> Self {
        Self::Mute
    }
}

impl FloodAction {
    /// Every accepted action, in the order shown to admins.
    pub const ALL: [FloodAction; 5] = [
        Self::Ban,
        Self::Mute,
        Self::Kick,
        Self::TimedBan,
        Self::TimedMute,
    ];

    /// Stored / command form of the action.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ban => "ban",
            Self::Mute => "mute",
            Self::Kick => "kick",
            Self::TimedBan => "tban",
            Self::TimedMute => "tmute",
        }
    }

    /// i18n key for the past-tense verb ("banned", "muted", ...).
    pub fn past_tense_key(self) -> &'static str {
        match self {
            Self::Ban => "antiflood.action_ban",
            Self::Mute => "antiflood.action_mute",
            Self::Kick => "antiflood.action_kick",
            Self::TimedBan => "antiflood.action_tban",
            Self::TimedMute => "antiflood.action_tmute",
        }
    }
}

impl fmt::Display for FloodAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FloodAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s)
            .ok_or(())
    }
}

/// Resolved flood configuration for one chat.
///
/// Always complete: absent or partial stored records fall back to
/// [`FloodSettings::DISABLED`] field by field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloodSettings {
    /// Messages tolerated per burst (0 = disabled)
    pub threshold: u32,
    /// Burst window in seconds (0 = no expiry)
    pub window_secs: u32,
    pub action: FloodAction,
    pub delete_on_breach: bool,
}

impl FloodSettings {
    /// Settings of a chat that never configured antiflood.
    pub const DISABLED: FloodSettings = FloodSettings {
        threshold: 0,
        window_secs: 0,
        action: FloodAction::Mute,
        delete_on_breach: false,
    };

    pub fn is_enabled(&self) -> bool {
        self.threshold > 0
    }
}

impl Default for FloodSettings {
    fn default() -> Self {
        Self::DISABLED
    }
}

/// Stored antiflood document, one per chat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloodSettingsRecord {
    /// MongoDB document ID
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,

    /// Telegram chat ID (unique index)
    pub chat_id: i64,

    #[serde(default, deserialize_with = "lenient_count")]
    pub flood_limit: u32,

    /// Window in seconds
    #[serde(default, deserialize_with = "lenient_count")]
    pub flood_timer: u32,

    #[serde(default, deserialize_with = "lenient_action")]
    pub flood_action: FloodAction,

    #[serde(default, deserialize_with = "lenient_flag")]
    pub delete_flood: bool,
}

// Older documents may hold negative or fractional numbers, nulls, or
// unknown action names. Those fields fall back to their defaults instead of
// failing the whole record.

fn lenient_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
    let clamp = |n: i64| u32::try_from(n.max(0)).unwrap_or(u32::MAX);
    Ok(match Bson::deserialize(deserializer)? {
        Bson::Int32(n) => clamp(i64::from(n)),
        Bson::Int64(n) => clamp(n),
        Bson::Double(f) if f.is_finite() => clamp(f as i64),
        _ => 0,
    })
}

fn lenient_action<'de, D: Deserializer<'de>>(deserializer: D) -> Result<FloodAction, D::Error> {
    Ok(match Bson::deserialize(deserializer)? {
        Bson::String(s) => s.parse().unwrap_or_default(),
        _ => FloodAction::default(),
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    Ok(matches!(Bson::deserialize(deserializer)?, Bson::Boolean(true)))
}

impl FloodSettingsRecord {
    pub fn settings(&self) -> FloodSettings {
        FloodSettings {
            threshold: self.flood_limit,
            window_secs: self.flood_timer,
            action: self.flood_action,
            delete_on_breach: self.delete_flood,
        }
    }
}

/// Partial settings change; `None` fields are left untouched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SettingsUpdate {
    pub threshold: Option<u32>,
    pub window_secs: Option<u32>,
    pub action: Option<FloodAction>,
    pub delete_on_breach: Option<bool>,
}

impl SettingsUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge this update into resolved settings.
    #[cfg(test)]
    pub fn apply_to(&self, mut settings: FloodSettings) -> FloodSettings {
        if let Some(threshold) = self.threshold {
            settings.threshold = threshold;
        }
        if let Some(window_secs) = self.window_secs {
            settings.window_secs = window_secs;
        }
        if let Some(action) = self.action {
            settings.action = action;
        }
        if let Some(delete) = self.delete_on_breach {
            settings.delete_on_breach = delete;
        }
        settings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unconfigured_chat_is_disabled() {
        let settings = FloodSettings::default();
        assert_eq!(settings, FloodSettings::DISABLED);
        assert_eq!(settings.threshold, 0);
        assert_eq!(settings.window_secs, 0);
        assert_eq!(settings.action, FloodAction::Mute);
        assert!(!settings.delete_on_breach);
        assert!(!settings.is_enabled());
    }

    #[test]
    fn test_partial_record_resolves_to_defaults() {
        let record: FloodSettingsRecord =
            serde_json::from_str(r#"{"chat_id": -100123, "flood_limit": 4}"#).unwrap();

        let settings = record.settings();
        assert_eq!(settings.threshold, 4);
        assert_eq!(settings.window_secs, 0);
        assert_eq!(settings.action, FloodAction::Mute);
        assert!(!settings.delete_on_breach);
    }

    #[test]
    fn test_action_stored_names() {
        let record: FloodSettingsRecord = serde_json::from_str(
            r#"{"chat_id": 1, "flood_action": "tmute", "delete_flood": true}"#,
        )
        .unwrap();
        assert_eq!(record.flood_action, FloodAction::TimedMute);
        assert!(record.delete_flood);

        assert_eq!(serde_json::to_string(&FloodAction::TimedBan).unwrap(), "\"tban\"");
    }

    #[test]
    fn test_out_of_range_stored_values_fall_back() {
        use mongodb::bson::{self, doc};

        let record: FloodSettingsRecord = bson::from_document(doc! {
            "chat_id": -100i64,
            "flood_limit": -3i32,
            "flood_timer": 10i32,
        })
        .unwrap();
        assert_eq!(record.settings().threshold, 0);
        assert_eq!(record.settings().window_secs, 10);

        let record: FloodSettingsRecord = bson::from_document(doc! {
            "chat_id": -100i64,
            "flood_limit": 5_000_000_000i64,
            "flood_timer": -60i64,
            "flood_action": "warn",
            "delete_flood": bson::Bson::Null,
        })
        .unwrap();
        let settings = record.settings();
        assert_eq!(settings.threshold, u32::MAX);
        assert_eq!(settings.window_secs, 0);
        assert_eq!(settings.action, FloodAction::Mute);
        assert!(!settings.delete_on_breach);

        let record: FloodSettingsRecord = bson::from_document(doc! {
            "chat_id": -100i64,
            "flood_limit": 4.0f64,
            "flood_action": "TBAN",
            "delete_flood": true,
        })
        .unwrap();
        let settings = record.settings();
        assert_eq!(settings.threshold, 4);
        assert_eq!(settings.action, FloodAction::TimedBan);
        assert!(settings.delete_on_breach);
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("BAN".parse::<FloodAction>(), Ok(FloodAction::Ban));
        assert_eq!("kick".parse::<FloodAction>(), Ok(FloodAction::Kick));
        assert_eq!("tban".parse::<FloodAction>(), Ok(FloodAction::TimedBan));
        assert!("tempban".parse::<FloodAction>().is_err());
        assert!("warn".parse::<FloodAction>().is_err());
    }

    #[test]
    fn test_update_merges_only_given_fields() {
        let base = FloodSettings {
            threshold: 5,
            window_secs: 10,
            action: FloodAction::Ban,
            delete_on_breach: true,
        };
        let update = SettingsUpdate {
            window_secs: Some(30),
            ..Default::default()
        };

        let merged = update.apply_to(base);
        assert_eq!(merged.threshold, 5);
        assert_eq!(merged.window_secs, 30);
        assert_eq!(merged.action, FloodAction::Ban);
        assert!(merged.delete_on_breach);
        assert!(SettingsUpdate::default().is_empty());
        assert!(!update.is_empty());
    }
}
