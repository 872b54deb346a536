//! Tracing subscriber setup.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::error::CliError;

/// Level used when nothing else is configured.
const DEFAULT_LEVEL: &str = "warn";

/// Install the global subscriber.
///
/// `--verbose` forces `debug`, then the configured level applies, then
/// `RUST_LOG`, then [`DEFAULT_LEVEL`]. Logs go to stderr unless `log_file`
/// is set.
pub(crate) fn init(
    verbose: bool,
    log_level: Option<&str>,
    log_file: Option<&Path>,
) -> Result<(), CliError> {
    let filter = match directive(verbose, log_level) {
        Some(directive) => EnvFilter::try_new(directive)
            .map_err(|err| CliError::Logging(format!("invalid log level {directive:?}: {err}")))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
    };
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if let Some(path) = log_file {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|source| CliError::Write {
                path: path.to_path_buf(),
                source,
            })?;
        builder.with_writer(Mutex::new(file)).with_ansi(false).init();
    } else {
        builder.init();
    }
    Ok(())
}

/// Explicit filter directive, if any.
fn directive(verbose: bool, log_level: Option<&str>) -> Option<&str> {
    if verbose {
        Some("debug")
    } else {
        log_level.filter(|level| !level.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_verbose_forces_debug() {
        assert_eq!(directive(true, Some("error")), Some("debug"));
        assert_eq!(directive(true, None), Some("debug"));
    }

    #[test]
    fn test_configured_level() {
        assert_eq!(directive(false, Some("info")), Some("info"));
    }

    #[test]
    fn test_no_level_defers_to_environment() {
        assert_eq!(directive(false, None), None);
        assert_eq!(directive(false, Some("")), None);
    }
}
