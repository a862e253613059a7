//! Utility functions.
//!
//! Small helpers shared by command and event handlers.

pub mod duration;

pub use duration::parse_window_secs;

use teloxide::types::User;

/// Escape text for Telegram HTML parse mode.
pub fn html_escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// User's full name, escaped for HTML.
pub fn display_name(user: &User) -> String {
    html_escape(&user.full_name())
}

/// Whitespace-separated command arguments (without the command itself).
pub fn command_args(text: &str) -> Vec<&str> {
    text.split_whitespace().skip(1).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape("<b>Tom & \"Jerry\"</b>"),
            "&lt;b&gt;Tom &amp; &quot;Jerry&quot;&lt;/b&gt;"
        );
        assert_eq!(html_escape("plain"), "plain");
    }

    #[test]
    fn test_command_args() {
        assert_eq!(command_args("/setfloodtimer 10 30s"), vec!["10", "30s"]);
        assert_eq!(command_args("/flood@floodguard_bot"), Vec::<&str>::new());
        assert!(command_args("").is_empty());
    }
}
