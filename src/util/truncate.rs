//! Byte-bounded string truncation
//!
//! Payloads shipped to the backend have hard size limits, so large values
//! (working-tree diffs in particular) are cut down before they are attached.

/// Default maximum encoded size for a single attached value.
pub const DEFAULT_BYTE_LIMIT: usize = 65536;

/// Truncate `text` so its UTF-8 encoding is at most `max_bytes` long.
///
/// The result is always a prefix of `text` that ends on a character
/// boundary, so a multi-byte code point is never split. Text that already
/// fits is returned as-is.
///
/// ```
/// use gitstamp::util::truncate_to_byte_limit;
///
/// assert_eq!(truncate_to_byte_limit("hello", 10), "hello");
/// assert_eq!(truncate_to_byte_limit("hello", 3), "hel");
/// // "é" is two bytes and does not fit in one
/// assert_eq!(truncate_to_byte_limit("é", 1), "");
/// ```
pub fn truncate_to_byte_limit(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }

    // A UTF-8 code point is at most 4 bytes, so the boundary is within
    // three steps back from the limit.
    let mut end = max_bytes;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// Truncate `text` to [`DEFAULT_BYTE_LIMIT`].
pub fn truncate_default(text: &str) -> &str {
    truncate_to_byte_limit(text, DEFAULT_BYTE_LIMIT)
}
