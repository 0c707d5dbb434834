//! SQL utility functions

/// Escape SQL LIKE metacharacters (%, _, \) in user input
///
/// Use this when building LIKE patterns from user input to prevent
/// unintended pattern matching. The result is always bound as a parameter.
///
/// # Example
///
/// ```
/// use tracelens_server::utils::sql::escape_like_pattern;
///
/// let user_input = "100% match_test";
/// let pattern = format!("%{}%", escape_like_pattern(user_input));
/// assert_eq!(pattern, "%100\\% match\\_test%");
/// ```
pub fn escape_like_pattern(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Position of the caller's text inside a LIKE pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeMatch {
    Contains,
    StartsWith,
    EndsWith,
}

/// Build an escaped LIKE pattern for a string match
pub fn like_pattern(value: &str, kind: LikeMatch) -> String {
    let escaped = escape_like_pattern(value);
    match kind {
        LikeMatch::Contains => format!("%{}%", escaped),
        LikeMatch::StartsWith => format!("{}%", escaped),
        LikeMatch::EndsWith => format!("%{}", escaped),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_like_pattern_no_special_chars() {
        assert_eq!(escape_like_pattern("hello"), "hello");
    }

    #[test]
    fn test_escape_like_pattern_multiple() {
        assert_eq!(escape_like_pattern("100%_\\test"), "100\\%\\_\\\\test");
    }

    #[test]
    fn test_escape_like_pattern_empty() {
        assert_eq!(escape_like_pattern(""), "");
    }

    #[test]
    fn test_like_pattern_positions() {
        assert_eq!(like_pattern("gpt", LikeMatch::Contains), "%gpt%");
        assert_eq!(like_pattern("gpt", LikeMatch::StartsWith), "gpt%");
        assert_eq!(like_pattern("gpt", LikeMatch::EndsWith), "%gpt");
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("a_b%", LikeMatch::Contains), "%a\\_b\\%%");
    }
}
