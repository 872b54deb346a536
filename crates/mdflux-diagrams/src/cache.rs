//! In-memory cache of rendered diagrams.
//!
//! Documents often repeat the same diagram; the browser round trip is by
//! far the slowest step of a conversion.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use sha2::{Digest, Sha256};

use crate::render::{DiagramRenderer, RenderError};

/// Parameters that determine a rendered diagram.
#[derive(Debug)]
pub struct DiagramKey<'a> {
    /// Diagram source code.
    pub source: &'a str,
    /// Mermaid theme.
    pub theme: &'a str,
}

impl DiagramKey<'_> {
    /// Hex-encoded SHA-256 of `"{theme}:{source}"`.
    #[must_use]
    pub fn compute_hash(&self) -> String {
        let content = format!("{}:{}", self.theme, self.source);
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// Memoizes successful renders of an inner [`DiagramRenderer`].
///
/// Failures are not cached, so a diagram that failed once is retried.
pub struct CachingRenderer {
    inner: Arc<dyn DiagramRenderer>,
    theme: String,
    entries: Mutex<HashMap<String, String>>,
}

impl CachingRenderer {
    #[must_use]
    pub fn new(inner: Arc<dyn DiagramRenderer>, theme: impl Into<String>) -> Self {
        Self {
            inner,
            theme: theme.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of cached diagrams.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl DiagramRenderer for CachingRenderer {
    fn render(&self, source: &str) -> Result<String, RenderError> {
        let key = DiagramKey {
            source,
            theme: &self.theme,
        }
        .compute_hash();

        if let Some(svg) = self
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            tracing::trace!(hash = %key, "Diagram cache hit");
            return Ok(svg.clone());
        }

        let svg = self.inner.render(source)?;
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, svg.clone());
        Ok(svg)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use pretty_assertions::assert_eq;

    use super::*;

    #[derive(Default)]
    struct Counting {
        calls: AtomicUsize,
    }

    impl DiagramRenderer for Counting {
        fn render(&self, source: &str) -> Result<String, RenderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if source.contains("bad") {
                return Err(RenderError::Diagram("syntax".to_owned()));
            }
            Ok(format!("<svg>{source}</svg>"))
        }
    }

    #[test]
    fn test_diagram_key_hash() {
        let key1 = DiagramKey {
            source: "graph TD",
            theme: "default",
        };
        let key2 = DiagramKey {
            source: "graph TD",
            theme: "dark",
        };

        assert_eq!(key1.compute_hash().len(), 64);
        assert!(key1.compute_hash().chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(key1.compute_hash(), key2.compute_hash());
    }

    #[test]
    fn test_repeated_source_rendered_once() {
        let inner = Arc::new(Counting::default());
        let cache = CachingRenderer::new(Arc::clone(&inner) as Arc<dyn DiagramRenderer>, "default");

        assert_eq!(cache.render("A").unwrap(), "<svg>A</svg>");
        assert_eq!(cache.render("A").unwrap(), "<svg>A</svg>");
        assert_eq!(cache.render("B").unwrap(), "<svg>B</svg>");

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_failures_not_cached() {
        let inner = Arc::new(Counting::default());
        let cache = CachingRenderer::new(Arc::clone(&inner) as Arc<dyn DiagramRenderer>, "default");

        assert!(cache.render("bad").is_err());
        assert!(cache.render("bad").is_err());

        assert_eq!(inner.calls.load(Ordering::SeqCst), 2);
        assert!(cache.is_empty());
    }
}
