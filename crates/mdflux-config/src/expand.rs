//! Environment variable expansion for configuration strings.

use std::borrow::Cow;

use crate::ConfigError;

/// Expand `${VAR}` and `${VAR:-default}` references in `value`.
///
/// `field` names the config key in error messages.
pub(crate) fn expand_env(value: &str, field: &str) -> Result<String, ConfigError> {
    shellexpand::env(value)
        .map(Cow::into_owned)
        .map_err(|err| ConfigError::EnvVar {
            field: field.to_owned(),
            message: format!("${{{}}} not set", err.var_name),
        })
}

/// Expand an optional value, leaving `None` untouched.
pub(crate) fn expand_opt(value: Option<&str>, field: &str) -> Result<Option<String>, ConfigError> {
    value.map(|v| expand_env(v, field)).transpose()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_plain_value_unchanged() {
        assert_eq!(expand_env("README.md", "input.file").unwrap(), "README.md");
    }

    #[test]
    fn test_expands_set_variable() {
        // SAFETY: test runs single-threaded per test function
        unsafe {
            std::env::set_var("MDFLUX_TEST_EXPAND_DIR", "/srv/docs");
        }

        assert_eq!(
            expand_env("${MDFLUX_TEST_EXPAND_DIR}/out.pdf", "output.file").unwrap(),
            "/srv/docs/out.pdf"
        );
    }

    #[test]
    fn test_default_used_when_unset() {
        assert_eq!(
            expand_env("${MDFLUX_TEST_EXPAND_UNSET:-fallback.md}", "input.file").unwrap(),
            "fallback.md"
        );
    }

    #[test]
    fn test_unset_variable_is_error() {
        let err = expand_env("${MDFLUX_TEST_EXPAND_MISSING}", "chrome.path").unwrap_err();

        match err {
            ConfigError::EnvVar { field, message } => {
                assert_eq!(field, "chrome.path");
                assert_eq!(message, "${MDFLUX_TEST_EXPAND_MISSING} not set");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_expand_opt_none() {
        assert_eq!(expand_opt(None, "log_file").unwrap(), None);
    }
}
