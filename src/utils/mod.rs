//! Utility functions and helpers.

pub mod http;

/// Keep the first `max_chars` characters of `text`.
pub fn take_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}

/// Case-insensitive check that `text` contains any of `needles`.
pub fn contains_any_ignore_case(text: &str, needles: &[String]) -> bool {
    let haystack = text.to_lowercase();
    needles
        .iter()
        .any(|needle| haystack.contains(&needle.to_lowercase()))
}
