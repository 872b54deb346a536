use std::fmt;
use std::path::PathBuf;

/// Scale used when the configured one is not positive.
pub const DEFAULT_SCALE: f64 = 0.8;

/// Default margin on every side, in inches.
pub const DEFAULT_MARGIN: f64 = 0.5;

/// Paper size.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
}

impl PageSize {
    /// Parse a page size name. Unknown names fall back to A4.
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name {
            "Letter" => Self::Letter,
            "Legal" => Self::Legal,
            "A4" => Self::A4,
            other => {
                tracing::debug!(page_size = other, "Unknown page size, using A4");
                Self::A4
            }
        }
    }

    /// Portrait width and height in inches.
    #[must_use]
    pub fn dimensions(self) -> (f64, f64) {
        match self {
            Self::A4 => (8.27, 11.69),
            Self::Letter => (8.5, 11.0),
            Self::Legal => (8.5, 14.0),
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::A4 => "A4",
            Self::Letter => "Letter",
            Self::Legal => "Legal",
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Page geometry and browser selection for one export.
#[derive(Debug, Clone, PartialEq)]
pub struct PdfOptions {
    pub page_size: PageSize,
    pub landscape: bool,
    /// Print scale. Values `<= 0` are replaced by [`DEFAULT_SCALE`].
    pub scale: f64,
    pub margin_top: f64,
    pub margin_bottom: f64,
    pub margin_left: f64,
    pub margin_right: f64,
    /// Explicit browser executable.
    pub executable: Option<PathBuf>,
}

impl Default for PdfOptions {
    fn default() -> Self {
        Self {
            page_size: PageSize::A4,
            landscape: false,
            scale: DEFAULT_SCALE,
            margin_top: DEFAULT_MARGIN,
            margin_bottom: DEFAULT_MARGIN,
            margin_left: DEFAULT_MARGIN,
            margin_right: DEFAULT_MARGIN,
            executable: None,
        }
    }
}

impl PdfOptions {
    /// Paper width and height in inches, swapped for landscape.
    #[must_use]
    pub fn paper_size(&self) -> (f64, f64) {
        let (width, height) = self.page_size.dimensions();
        if self.landscape {
            (height, width)
        } else {
            (width, height)
        }
    }

    /// Scale passed to the browser.
    #[must_use]
    pub fn effective_scale(&self) -> f64 {
        if self.scale <= 0.0 || self.scale.is_nan() {
            DEFAULT_SCALE
        } else {
            self.scale
        }
    }
}
