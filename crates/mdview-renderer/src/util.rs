//! Shared utility functions for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Whether `url` points outside the current document set.
///
/// Absolute URLs with a scheme (`https:`, `ftp:`, ...) and protocol-relative
/// URLs (`//host/...`) count as external. Fragments, relative paths,
/// `mailto:`/`tel:` links and script or inline-data schemes (`javascript:`,
/// `vbscript:`, `data:`, `blob:`) do not.
///
/// # Examples
///
/// ```
/// use mdview_renderer::is_external_url;
///
/// assert!(is_external_url("https://example.com"));
/// assert!(is_external_url("//cdn.example.com/x.js"));
/// assert!(!is_external_url("#section"));
/// assert!(!is_external_url("./guide.md"));
/// assert!(!is_external_url("mailto:a@b.c"));
/// assert!(!is_external_url("javascript:alert(1)"));
/// ```
#[must_use]
pub fn is_external_url(url: &str) -> bool {
    if url.starts_with("//") {
        return true;
    }
    let Some((scheme, _)) = url.split_once(':') else {
        return false;
    };
    let valid_scheme = scheme
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic())
        && scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
    valid_scheme
        && !matches!(
            scheme.to_ascii_lowercase().as_str(),
            "mailto" | "tel" | "javascript" | "vbscript" | "data" | "blob"
        )
}

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_schemes() {
        assert!(is_external_url("http://e.com"));
        assert!(is_external_url("HTTPS://E.COM/path"));
        assert!(is_external_url("ftp://files.example.com"));
        assert!(is_external_url("git+ssh://host/repo"));
    }

    #[test]
    fn test_internal_links() {
        assert!(!is_external_url(""));
        assert!(!is_external_url("/docs/guide"));
        assert!(!is_external_url("guide.md#intro"));
        assert!(!is_external_url("#fn1"));
        assert!(!is_external_url("?q=a:b"));
    }

    #[test]
    fn test_mail_and_phone_not_external() {
        assert!(!is_external_url("mailto:someone@example.com"));
        assert!(!is_external_url("tel:+123"));
    }

    #[test]
    fn test_non_navigational_schemes_not_external() {
        assert!(!is_external_url("javascript:alert(1)"));
        assert!(!is_external_url("JavaScript:void(0)"));
        assert!(!is_external_url("vbscript:msgbox"));
        assert!(!is_external_url("data:text/html;base64,PHA+"));
        assert!(!is_external_url("blob:https://e.com/1"));
    }

    #[test]
    fn test_colon_in_path_is_not_scheme() {
        assert!(!is_external_url("./a:b"));
        assert!(!is_external_url("1abc:foo"));
    }

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }
}
