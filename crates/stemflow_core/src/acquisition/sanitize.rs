//! Filesystem-safe names.

/// Characters that are not allowed in file names on common platforms.
const ILLEGAL: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Fallback when nothing usable is left after sanitizing.
const FALLBACK_NAME: &str = "audio";

/// Strip characters that are illegal in file names.
///
/// Control characters are removed too, and trailing dots and spaces are
/// trimmed (Windows rejects them).
pub fn sanitize_filename(name: &str) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !ILLEGAL.contains(c) && !c.is_control())
        .collect();

    let trimmed = stripped
        .trim()
        .trim_end_matches(|c: char| c == '.' || c == ' ');

    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
