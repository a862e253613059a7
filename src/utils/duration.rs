//! Window duration parsing.

/// Parse a flood window like `"30"`, `"30s"`, `"5m"`, `"1h"` or `"1d"` into
/// whole seconds.
///
/// A bare number is seconds. Returns `None` for negative, malformed or
/// out-of-range input.
pub fn parse_window_secs(input: &str) -> Option<u32> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }

    let (digits, multiplier) = match input.char_indices().last() {
        Some((idx, 's')) => (&input[..idx], 1),
        Some((idx, 'm')) => (&input[..idx], 60),
        Some((idx, 'h')) => (&input[..idx], 3_600),
        Some((idx, 'd')) => (&input[..idx], 86_400),
        _ => (input.as_str(), 1),
    };

    let amount: u32 = digits.parse().ok()?;
    amount.checked_mul(multiplier)
}
