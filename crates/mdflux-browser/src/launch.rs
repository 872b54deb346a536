use std::path::PathBuf;
use std::time::Duration;

/// How long the DevTools connection may sit idle before the driver gives up.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(600);

/// Flags passed to every browser launch.
///
/// Headless mode, sandbox and GPU are set through the driver's own options.
const BASE_ARGS: &[&str] = &[
    "--no-first-run",
    "--no-default-browser-check",
    "--disable-setuid-sandbox",
    "--no-zygote",
    "--disable-extensions",
];

const SHM_WORKAROUND_ARG: &str = "--disable-dev-shm-usage";

/// Deterministic browser launch configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Explicit browser executable. Auto-detected when `None`.
    pub executable: Option<PathBuf>,
    /// Pass `--disable-dev-shm-usage` (small `/dev/shm` in containers).
    pub shm_workaround: bool,
    /// Idle timeout of the DevTools connection.
    pub idle_timeout: Duration,
    /// Timeout for page waits. Driver default when `None`.
    pub wait_timeout: Option<Duration>,
}

impl LaunchConfig {
    /// Configuration for the long-lived diagram render session.
    #[must_use]
    pub fn for_rendering() -> Self {
        Self {
            executable: None,
            shm_workaround: true,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            wait_timeout: None,
        }
    }

    /// Configuration for a one-shot PDF export.
    #[must_use]
    pub fn for_printing() -> Self {
        Self {
            shm_workaround: false,
            ..Self::for_rendering()
        }
    }

    /// Use a specific browser executable.
    #[must_use]
    pub fn with_executable(mut self, executable: Option<PathBuf>) -> Self {
        self.executable = executable;
        self
    }

    /// Bound page waits (navigation, readiness selector).
    #[must_use]
    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }

    /// Extra command-line flags for the browser process.
    #[must_use]
    pub fn args(&self) -> Vec<&'static str> {
        let mut args = BASE_ARGS.to_vec();
        if self.shm_workaround {
            args.push(SHM_WORKAROUND_ARG);
        }
        args
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::for_rendering()
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_rendering_config_enables_shm_workaround() {
        let config = LaunchConfig::for_rendering();

        assert_eq!(
            config.args(),
            vec![
                "--no-first-run",
                "--no-default-browser-check",
                "--disable-setuid-sandbox",
                "--no-zygote",
                "--disable-extensions",
                "--disable-dev-shm-usage",
            ]
        );
        assert_eq!(config.idle_timeout, Duration::from_secs(600));
    }

    #[test]
    fn test_printing_config_omits_shm_workaround() {
        let config = LaunchConfig::for_printing();

        assert!(!config.args().contains(&"--disable-dev-shm-usage"));
        assert_eq!(config.args().len(), 5);
    }

    #[test]
    fn test_builder_methods() {
        let config = LaunchConfig::for_printing()
            .with_executable(Some(PathBuf::from("/usr/bin/chromium")))
            .with_wait_timeout(Duration::from_secs(5));

        assert_eq!(config.executable, Some(PathBuf::from("/usr/bin/chromium")));
        assert_eq!(config.wait_timeout, Some(Duration::from_secs(5)));
    }
}
