//! `${VAR}` and `${VAR:-default}` expansion for configuration strings.

use crate::ConfigError;

/// Expand environment variable references in `value`.
///
/// Only the braced form is recognized as a reference worth expanding; strings
/// without `${` are returned unchanged. An unset variable without a default
/// is an error naming `field`.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    if !value.contains("${") {
        return Ok(value.to_owned());
    }

    shellexpand::env_with_context(value, |var| -> Result<Option<String>, UnsetVar> {
        std::env::var(var).map(Some).map_err(|_| UnsetVar(var.to_owned()))
    })
    .map(std::borrow::Cow::into_owned)
    .map_err(|e| ConfigError::EnvVar {
        field: field.to_owned(),
        message: format!("${{{}}} not set", e.cause.0),
    })
}

/// Expand an optional value in place.
pub(crate) fn expand_opt(value: &mut Option<String>, field: &str) -> Result<(), ConfigError> {
    if let Some(v) = value.as_deref() {
        *value = Some(expand_env(v, field)?);
    }
    Ok(())
}

struct UnsetVar(String);

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_expand_var() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::set_var("MDVIEW_TEST_EXPAND_HOST", "docs.example.com");
        }
        assert_eq!(
            expand_env("https://${MDVIEW_TEST_EXPAND_HOST}/md/", "fetch.base_url").unwrap(),
            "https://docs.example.com/md/"
        );
        unsafe {
            std::env::remove_var("MDVIEW_TEST_EXPAND_HOST");
        }
    }

    #[test]
    fn test_expand_default() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDVIEW_TEST_EXPAND_UNSET");
        }
        assert_eq!(
            expand_env("${MDVIEW_TEST_EXPAND_UNSET:-mdview}", "fetch.user_agent").unwrap(),
            "mdview"
        );
    }

    #[test]
    fn test_expand_missing() {
        // SAFETY: variable name is unique to this test
        unsafe {
            std::env::remove_var("MDVIEW_TEST_EXPAND_MISSING");
        }
        let err = expand_env("${MDVIEW_TEST_EXPAND_MISSING}", "fetch.base_url").unwrap_err();
        assert!(matches!(err, ConfigError::EnvVar { .. }));
        assert_eq!(
            err.to_string(),
            "Environment variable error in fetch.base_url: ${MDVIEW_TEST_EXPAND_MISSING} not set"
        );
    }

    #[test]
    fn test_literal_and_bare_dollar_unchanged() {
        assert_eq!(expand_env("plain", "f").unwrap(), "plain");
        assert_eq!(expand_env("https://e.com/$path", "f").unwrap(), "https://e.com/$path");
    }

    #[test]
    fn test_expand_opt() {
        let mut none = None;
        expand_opt(&mut none, "f").unwrap();
        assert_eq!(none, None);

        let mut some = Some("${MDVIEW_TEST_EXPAND_OPT:-x}".to_owned());
        expand_opt(&mut some, "f").unwrap();
        assert_eq!(some.as_deref(), Some("x"));
    }
}
