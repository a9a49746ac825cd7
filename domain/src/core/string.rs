//! String utilities for the domain layer.

/// Truncate a string to a maximum length with ellipsis (UTF-8 safe)
///
/// Uses byte length for max_len but ensures truncation occurs at valid
/// UTF-8 character boundaries.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        let target = max_len.saturating_sub(3);
        let mut end = target.min(s.len());
        while end > 0 && !s.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &s[..end])
    }
}

/// Number of Unicode scalar values in `s`.
///
/// Length thresholds throughout the workflow are expressed in characters,
/// not bytes, so Hangul and ASCII messages are measured the same way.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}
