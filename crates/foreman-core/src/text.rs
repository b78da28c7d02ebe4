//! UTF-8–safe text clamping.
//!
//! `&str[..n]` panics when `n` falls inside a multi-byte character, so
//! the compression fallback cannot slice transcripts naively. These
//! helpers snap to the nearest char boundary below the byte budget.

/// Longest prefix of `s` that fits in `max_bytes` without splitting a
/// character.
#[inline]
pub fn prefix_bytes(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Clamp `s` to `max_bytes`, marking elision with a trailing marker.
///
/// The result (marker included) never exceeds `max_bytes`. Strings that
/// already fit are returned unchanged.
pub fn clamp_utf8(s: &str, max_bytes: usize) -> String {
    const MARKER: &str = " [truncated]";
    if s.len() <= max_bytes {
        return s.to_owned();
    }
    if max_bytes <= MARKER.len() {
        return prefix_bytes(s, max_bytes).to_owned();
    }
    let body = prefix_bytes(s, max_bytes - MARKER.len());
    format!("{body}{MARKER}")
}
