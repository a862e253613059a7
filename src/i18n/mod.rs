//! Internationalization (i18n) module.
//!
//! User-facing strings, looked up by dotted key (e.g. `"antiflood.mode_done"`).
//! Catalogues are embedded with `include_str!`; unknown languages and missing
//! keys fall back to English.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;
use tracing::warn;

const DEFAULT_LANG: &str = "en";

/// Global translation store: LangCode -> nested key tree
static TRANSLATIONS: OnceLock<HashMap<String, Value>> = OnceLock::new();

fn load() -> HashMap<String, Value> {
    let mut map = HashMap::new();

    match serde_json::from_str(include_str!("en.json")) {
        Ok(val) => {
            map.insert(DEFAULT_LANG.to_string(), val);
        }
        Err(e) => warn!("Failed to parse en.json: {}", e),
    }

    map
}

/// Force-load the catalogues at startup.
pub fn init() {
    let store = TRANSLATIONS.get_or_init(load);
    tracing::debug!("Loaded {} translation catalogue(s)", store.len());
}

/// Get text for a key in a specific language.
///
/// Returns the key itself when no catalogue has it.
pub fn get_text(lang: &str, key: &str) -> String {
    let store = TRANSLATIONS.get_or_init(load);

    if let Some(text) = store.get(lang).and_then(|val| resolve_key(val, key)) {
        return text;
    }

    if lang != DEFAULT_LANG
        && let Some(text) = store.get(DEFAULT_LANG).and_then(|val| resolve_key(val, key))
    {
        return text;
    }

    key.to_string()
}

fn resolve_key(val: &Value, key: &str) -> Option<String> {
    let mut current = val;
    for part in key.split('.') {
        current = current.get(part)?;
    }
    current.as_str().map(|s| s.to_string())
}

/// Resolve effective locale.
/// Priority: user's client language -> English.
pub fn resolve_locale(user_lang: Option<&str>) -> String {
    user_lang
        .map(|l| l.split('-').next().unwrap_or(l).to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| DEFAULT_LANG.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_lookup() {
        assert_eq!(get_text("en", "antiflood.action_mute"), "muted");
    }

    #[test]
    fn test_unknown_language_falls_back_to_english() {
        assert_eq!(get_text("xx", "antiflood.action_kick"), "kicked");
    }

    #[test]
    fn test_missing_key_returns_key() {
        assert_eq!(get_text("en", "antiflood.nope"), "antiflood.nope");
        assert_eq!(get_text("en", "antiflood"), "antiflood");
    }

    #[test]
    fn test_every_action_has_text() {
        for action in crate::database::FloodAction::ALL {
            let key = action.past_tense_key();
            assert_ne!(get_text("en", key), key);
        }
    }

    #[test]
    fn test_resolve_locale() {
        assert_eq!(resolve_locale(Some("pt-BR")), "pt");
        assert_eq!(resolve_locale(Some("EN")), "en");
        assert_eq!(resolve_locale(None), "en");
        assert_eq!(resolve_locale(Some("")), "en");
    }
}
