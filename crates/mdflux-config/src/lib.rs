//! Configuration management for mdflux.
//!
//! Parses `mdflux.toml` configuration files with serde and provides
//! auto-discovery of config files in parent directories, falling back to
//! `~/.config/mdflux/mdflux.toml`.
//!
//! CLI settings can be applied during load via [`CliSettings`].
//!
//! ## Environment Variable Expansion
//!
//! String configuration values support environment variable expansion:
//!
//! - `${VAR}` - expands to the value of VAR, errors if unset
//! - `${VAR:-default}` - expands to VAR if set, otherwise uses default
//!
//! Expanded fields:
//! - `log_file`
//! - `input.file`
//! - `output.file`
//! - `mermaid.script`
//! - `mermaid.script_url`
//! - `chrome.path`

mod expand;

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;

/// Configuration filename to search for.
const CONFIG_FILENAME: &str = "mdflux.toml";

/// CLI settings that override configuration file values.
///
/// All fields are optional. Only non-None values override the loaded config.
#[derive(Debug, Default)]
pub struct CliSettings {
    /// Override input file (`-` reads stdin).
    pub input: Option<PathBuf>,
    /// Override output file (`-` writes stdout).
    pub output: Option<PathBuf>,
    /// Override output format.
    pub format: Option<OutputFormat>,
    /// Override page color theme.
    pub theme: Option<HtmlTheme>,
    /// Override log level.
    pub log_level: Option<String>,
    /// Override log file.
    pub log_file: Option<PathBuf>,
    /// Override mermaid rendering mode.
    pub mermaid_mode: Option<MermaidMode>,
    /// Override PDF page size.
    pub page_size: Option<String>,
    /// Override PDF orientation.
    pub landscape: Option<bool>,
    /// Override browser executable. Implies manual chrome mode.
    pub chrome_path: Option<PathBuf>,
}

macro_rules! config_enum {
    ($(#[$meta:meta])* $name:ident, $field:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
        #[serde(rename_all = "lowercase")]
        pub enum $name {
            #[default]
            $($variant),+
        }

        impl $name {
            /// Name as written in configuration.
            #[must_use]
            pub fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ConfigError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(ConfigError::Validation(format!(
                        "{} must be one of {}, got {other:?}",
                        $field,
                        [$($text),+].join(", ")
                    ))),
                }
            }
        }
    };
}

config_enum!(
    /// Output document format.
    OutputFormat, "output.format" { Html => "html", Pdf => "pdf" }
);

config_enum!(
    /// Page color theme.
    HtmlTheme, "html.theme" { Auto => "auto", Light => "light", Dark => "dark" }
);

config_enum!(
    /// Where mermaid diagrams are rendered.
    MermaidMode, "mermaid.mode" { Server => "server", Client => "client" }
);

config_enum!(
    /// Browser executable selection.
    ChromeMode, "chrome.mode" { Auto => "auto", Manual => "manual" }
);

/// Application configuration with resolved paths.
#[derive(Debug)]
pub struct Config {
    /// Log level (`trace`, `debug`, `info`, `warn`, `error`).
    pub log_level: Option<String>,
    /// Log file. Logs go to stderr when `None`.
    pub log_file: Option<PathBuf>,
    /// Input configuration.
    pub input: InputConfig,
    /// Output configuration.
    pub output: OutputConfig,
    /// HTML page configuration.
    pub html: HtmlConfig,
    /// Markdown dialect configuration.
    pub markdown: MarkdownConfig,
    /// Mermaid configuration.
    pub mermaid: MermaidConfig,
    /// PDF page geometry.
    pub pdf: PdfConfig,
    /// Browser selection.
    pub chrome: ChromeConfig,
    /// Path to the config file (set after loading).
    pub config_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        ConfigRaw::default().resolve(Path::new("."))
    }
}

/// Resolved input configuration.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct InputConfig {
    /// Markdown file. Reads stdin when `None`.
    pub file: Option<PathBuf>,
}

/// Resolved output configuration.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct OutputConfig {
    /// Output file. Writes stdout when `None`.
    pub file: Option<PathBuf>,
    /// Output format.
    pub format: OutputFormat,
}

/// HTML page configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct HtmlConfig {
    /// Page color theme.
    pub theme: HtmlTheme,
    /// Document title.
    pub title: String,
    /// Pass raw HTML through.
    #[serde(rename = "unsafe")]
    pub unsafe_html: bool,
    /// Render soft line breaks as `<br>`.
    pub hard_wraps: bool,
    /// Emit an XHTML 1.0 document instead of HTML5.
    pub xhtml: bool,
}

impl Default for HtmlConfig {
    fn default() -> Self {
        Self {
            theme: HtmlTheme::Auto,
            title: "Document".to_owned(),
            unsafe_html: false,
            hard_wraps: false,
            xhtml: false,
        }
    }
}

/// Markdown extensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MarkdownConfig {
    pub tables: bool,
    pub strikethrough: bool,
    pub task_lists: bool,
    pub footnotes: bool,
    pub smart_punctuation: bool,
    pub definition_lists: bool,
}

impl Default for MarkdownConfig {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            smart_punctuation: true,
            definition_lists: true,
        }
    }
}

/// Resolved mermaid configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MermaidConfig {
    /// Whether mermaid blocks are processed at all.
    pub enabled: bool,
    /// Server-side (inline SVG) or client-side rendering.
    pub mode: MermaidMode,
    /// Mermaid theme name.
    pub theme: String,
    /// Local mermaid library, inlined into pages when set.
    pub script: Option<PathBuf>,
    /// Remote mermaid library used when no local script is set. The
    /// library built into the binary (or the jsDelivr bundle) is used when
    /// neither is set.
    pub script_url: Option<String>,
}

impl Default for MermaidConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: MermaidMode::Server,
            theme: "default".to_owned(),
            script: None,
            script_url: None,
        }
    }
}

/// PDF page geometry. Lengths in inches.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PdfConfig {
    /// `A4`, `Letter` or `Legal`. Unknown values print as A4.
    pub page_size: String,
    pub landscape: bool,
    pub scale: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
}

impl Default for PdfConfig {
    fn default() -> Self {
        Self {
            page_size: "A4".to_owned(),
            landscape: false,
            scale: 0.8,
            margin_top: 0.5,
            margin_bottom: 0.5,
            margin_left: 0.5,
            margin_right: 0.5,
        }
    }
}

/// Resolved browser selection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChromeConfig {
    pub mode: ChromeMode,
    /// Browser executable, used in manual mode only.
    pub path: Option<PathBuf>,
}

impl ChromeConfig {
    /// Executable to launch, or `None` to auto-detect.
    #[must_use]
    pub fn executable(&self) -> Option<&Path> {
        match self.mode {
            ChromeMode::Manual => self.path.as_deref(),
            ChromeMode::Auto => None,
        }
    }
}

/// Raw configuration as parsed from TOML (paths as strings).
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigRaw {
    log_level: Option<String>,
    log_file: Option<String>,
    input: InputConfigRaw,
    output: OutputConfigRaw,
    html: HtmlConfig,
    markdown: MarkdownConfig,
    mermaid: MermaidConfigRaw,
    pdf: PdfConfig,
    chrome: ChromeConfigRaw,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct InputConfigRaw {
    file: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct OutputConfigRaw {
    file: Option<String>,
    format: OutputFormat,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct MermaidConfigRaw {
    enabled: bool,
    mode: MermaidMode,
    theme: String,
    script: Option<String>,
    script_url: Option<String>,
}

impl Default for MermaidConfigRaw {
    fn default() -> Self {
        let resolved = MermaidConfig::default();
        Self {
            enabled: resolved.enabled,
            mode: resolved.mode,
            theme: resolved.theme,
            script: None,
            script_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ChromeConfigRaw {
    mode: ChromeMode,
    path: Option<String>,
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File not found.
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// TOML parsing error.
    #[error("TOML parse error: {0}")]
    Parse(#[from] toml::de::Error),
    /// Validation error.
    #[error("Configuration error: {0}")]
    Validation(String),
    /// Environment variable error during expansion.
    #[error("Environment variable error in {field}: {message}")]
    EnvVar {
        /// Config field path (e.g., "`chrome.path`").
        field: String,
        /// Error message (e.g., "${`CHROME_BIN`} not set").
        message: String,
    },
}

/// Require a string field to be non-empty.
fn require_non_empty(value: &str, field: &str) -> Result<(), ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::Validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

/// Require a URL field to use http:// or https:// scheme.
fn require_http_url(url: &str, field: &str) -> Result<(), ConfigError> {
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(format!(
            "{field} must start with http:// or https://"
        )));
    }
    Ok(())
}

/// Require a length to be a finite, non-negative number.
fn require_non_negative(value: f64, field: &str) -> Result<(), ConfigError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

/// `""` and `"-"` select the standard streams.
fn is_stream(path: &str) -> bool {
    path.is_empty() || path == "-"
}

impl ConfigRaw {
    /// Expand environment variable references in configuration strings.
    fn expand_env_vars(&mut self) -> Result<(), ConfigError> {
        self.log_file = expand::expand_opt(self.log_file.as_deref(), "log_file")?;
        self.input.file = expand::expand_opt(self.input.file.as_deref(), "input.file")?;
        self.output.file = expand::expand_opt(self.output.file.as_deref(), "output.file")?;
        self.mermaid.script = expand::expand_opt(self.mermaid.script.as_deref(), "mermaid.script")?;
        self.mermaid.script_url =
            expand::expand_opt(self.mermaid.script_url.as_deref(), "mermaid.script_url")?;
        self.chrome.path = expand::expand_opt(self.chrome.path.as_deref(), "chrome.path")?;
        Ok(())
    }

    /// Resolve relative paths against the config file's directory.
    fn resolve(self, config_dir: &Path) -> Config {
        let resolve = |path: Option<String>| path.map(|p| config_dir.join(p));
        let stream_or_path = |path: Option<String>| {
            path.filter(|p| !is_stream(p)).map(|p| config_dir.join(p))
        };

        Config {
            log_level: self.log_level.filter(|level| !level.is_empty()),
            log_file: resolve(self.log_file.filter(|p| !p.is_empty())),
            input: InputConfig {
                file: stream_or_path(self.input.file),
            },
            output: OutputConfig {
                file: stream_or_path(self.output.file),
                format: self.output.format,
            },
            html: self.html,
            markdown: self.markdown,
            mermaid: MermaidConfig {
                enabled: self.mermaid.enabled,
                mode: self.mermaid.mode,
                theme: self.mermaid.theme,
                script: resolve(self.mermaid.script.filter(|p| !p.is_empty())),
                script_url: self.mermaid.script_url,
            },
            pdf: self.pdf,
            chrome: ChromeConfig {
                mode: self.chrome.mode,
                path: resolve(self.chrome.path.filter(|p| !p.is_empty())),
            },
            config_path: None,
        }
    }
}

impl Config {
    /// Load configuration from file with optional CLI settings.
    ///
    /// If `config_path` is provided, loads from that file. Otherwise,
    /// searches for `mdflux.toml` in the current directory and its parents,
    /// then in `~/.config/mdflux/`.
    ///
    /// CLI settings are applied after loading and path resolution, allowing CLI
    /// arguments to take precedence over config file values.
    ///
    /// # Errors
    ///
    /// Returns error if explicit `config_path` doesn't exist, parsing fails,
    /// or the resulting configuration is invalid.
    pub fn load(
        config_path: Option<&Path>,
        cli_settings: Option<&CliSettings>,
    ) -> Result<Self, ConfigError> {
        let mut config = if let Some(path) = config_path {
            if !path.exists() {
                return Err(ConfigError::NotFound(path.to_path_buf()));
            }
            Self::load_from_file(path)?
        } else if let Some(discovered) = Self::discover_config() {
            Self::load_from_file(&discovered)?
        } else {
            Self::default()
        };

        if let Some(settings) = cli_settings {
            config.apply_cli_settings(settings);
        }

        config.validate()?;
        Ok(config)
    }

    /// Apply CLI settings to the configuration.
    fn apply_cli_settings(&mut self, settings: &CliSettings) {
        let stream_or_path = |path: &PathBuf| {
            if is_stream(&path.to_string_lossy()) {
                None
            } else {
                Some(path.clone())
            }
        };

        if let Some(input) = &settings.input {
            self.input.file = stream_or_path(input);
        }
        if let Some(output) = &settings.output {
            self.output.file = stream_or_path(output);
        }
        if let Some(format) = settings.format {
            self.output.format = format;
        }
        if let Some(theme) = settings.theme {
            self.html.theme = theme;
        }
        if let Some(log_level) = &settings.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(log_file) = &settings.log_file {
            self.log_file = Some(log_file.clone());
        }
        if let Some(mode) = settings.mermaid_mode {
            self.mermaid.mode = mode;
        }
        if let Some(page_size) = &settings.page_size {
            self.pdf.page_size.clone_from(page_size);
        }
        if let Some(landscape) = settings.landscape {
            self.pdf.landscape = landscape;
        }
        if let Some(chrome_path) = &settings.chrome_path {
            self.chrome.mode = ChromeMode::Manual;
            self.chrome.path = Some(chrome_path.clone());
        }
    }

    /// Search for config file in current directory and parents, then in
    /// the user config directory.
    fn discover_config() -> Option<PathBuf> {
        if let Ok(mut current) = std::env::current_dir() {
            loop {
                let candidate = current.join(CONFIG_FILENAME);
                if candidate.exists() {
                    return Some(candidate);
                }
                if !current.pop() {
                    break;
                }
            }
        }

        let home = std::env::var_os("HOME")?;
        let candidate = PathBuf::from(home)
            .join(".config")
            .join("mdflux")
            .join(CONFIG_FILENAME);
        candidate.exists().then_some(candidate)
    }

    /// Load configuration from a specific file.
    fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content, path.parent().unwrap_or(Path::new(".")))
            .map(|config| Self {
                config_path: Some(path.to_path_buf()),
                ..config
            })
    }

    /// Parse configuration text, resolving relative paths against `config_dir`.
    ///
    /// # Errors
    ///
    /// Returns error if parsing or environment variable expansion fails.
    pub fn from_toml(content: &str, config_dir: &Path) -> Result<Self, ConfigError> {
        let mut raw: ConfigRaw = toml::from_str(content)?;

        // Expand environment variables before path resolution
        raw.expand_env_vars()?;

        Ok(raw.resolve(config_dir))
    }

    /// Validate configuration values.
    ///
    /// Called automatically by [`Config::load`] after CLI settings are applied.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` if any validation fails.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.validate_mermaid()?;
        self.validate_pdf()?;
        self.validate_chrome()?;
        Ok(())
    }

    fn validate_mermaid(&self) -> Result<(), ConfigError> {
        if self.mermaid.script.is_none()
            && let Some(url) = &self.mermaid.script_url
        {
            require_non_empty(url, "mermaid.script_url")?;
            require_http_url(url, "mermaid.script_url")?;
        }
        require_non_empty(&self.mermaid.theme, "mermaid.theme")?;
        Ok(())
    }

    fn validate_pdf(&self) -> Result<(), ConfigError> {
        // Non-positive scales fall back to the default at print time.
        if !self.pdf.scale.is_finite() {
            return Err(ConfigError::Validation(
                "pdf.scale must be a finite number".to_owned(),
            ));
        }
        require_non_negative(self.pdf.margin_top, "pdf.margin_top")?;
        require_non_negative(self.pdf.margin_bottom, "pdf.margin_bottom")?;
        require_non_negative(self.pdf.margin_left, "pdf.margin_left")?;
        require_non_negative(self.pdf.margin_right, "pdf.margin_right")?;
        Ok(())
    }

    fn validate_chrome(&self) -> Result<(), ConfigError> {
        if self.chrome.mode == ChromeMode::Manual && self.chrome.path.is_none() {
            return Err(ConfigError::Validation(
                "chrome.path is required when chrome.mode is \"manual\"".to_owned(),
            ));
        }
        Ok(())
    }
}
