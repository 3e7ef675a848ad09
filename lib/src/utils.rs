//! Utility functions for the stx402 library

use std::time::{SystemTime, UNIX_EPOCH};

/// Strip 0x prefix from hex string if present
pub fn strip_0x_prefix(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s)
}

/// Render a number in lowercase base 36.
pub fn to_base36(mut value: u128) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    // Every byte comes from DIGITS.
    out.into_iter().map(char::from).collect()
}

/// Milliseconds since the Unix epoch.
pub fn unix_millis() -> crate::error::Result<u128> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_millis())
}

/// Truncate a string to at most `max` bytes without splitting a character.
pub fn truncate_to_bytes(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_0x_prefix() {
        assert_eq!(strip_0x_prefix("0xabc123"), "abc123");
        assert_eq!(strip_0x_prefix("0Xabc123"), "abc123");
        assert_eq!(strip_0x_prefix("abc123"), "abc123");
        assert_eq!(strip_0x_prefix(" 0xabc123 "), "abc123");
    }

    #[test]
    fn test_to_base36() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        // Same as JavaScript's (1700000000000).toString(36)
        assert_eq!(to_base36(1_700_000_000_000), "loyw3v28");
    }

    #[test]
    fn test_truncate_to_bytes() {
        assert_eq!(truncate_to_bytes("hello", 10), "hello");
        assert_eq!(truncate_to_bytes("hello", 3), "hel");
        // "é" is two bytes; never cut it in half
        assert_eq!(truncate_to_bytes("aé", 2), "a");
        assert_eq!(truncate_to_bytes("", 0), "");
    }
}
