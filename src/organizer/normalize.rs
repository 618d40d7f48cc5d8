//! Free text to filesystem-safe name component.

/// Result used when nothing survives normalization
pub const FALLBACK_NAME: &str = "unknown";

/// Turn free text into a filesystem-safe token
///
/// Keeps alphanumerics, whitespace, `-` and `_`; collapses whitespace runs
/// into single underscores and underscore runs into one; trims underscores
/// at both ends; truncates to `max_len` characters. Empty output becomes
/// [`FALLBACK_NAME`], itself truncated when `max_len` is shorter.
///
/// The transform is idempotent: `normalize(&normalize(s, n), n) == normalize(s, n)`.
///
/// ```
/// use closet_dl::organizer::normalize;
///
/// assert_eq!(normalize("Red Coat (size M)!", 100), "Red_Coat_size_M");
/// assert_eq!(normalize("***", 100), "unknown");
/// ```
#[must_use]
pub fn normalize(text: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_separator = false;

    for c in text.chars() {
        if c.is_whitespace() || c == '_' {
            pending_separator = true;
        } else if c.is_alphanumeric() || c == '-' {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        }
        // anything else is dropped without breaking the current run
    }

    if out.is_empty() {
        out.push_str(FALLBACK_NAME);
    }

    // the fallback obeys the limit too, or a second pass would shorten it
    if out.chars().count() > max_len {
        out = out.chars().take(max_len).collect();
        let trimmed = out.trim_end_matches('_').len();
        out.truncate(trimmed);
    }

    out
}
