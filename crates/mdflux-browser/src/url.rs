use std::path::Path;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

/// Characters escaped in a `file://` URL path. `/` is kept as separator.
const PATH_SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

/// Build a `file://` URL for a local path.
///
/// Relative paths are taken as-is; callers pass absolute paths.
#[must_use]
pub fn file_url(path: &Path) -> String {
    let raw = path.to_string_lossy().replace('\\', "/");
    let encoded = utf8_percent_encode(&raw, PATH_SEGMENT);
    if raw.starts_with('/') {
        format!("file://{encoded}")
    } else {
        format!("file:///{encoded}")
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_file_url_plain_path() {
        assert_eq!(
            file_url(Path::new("/tmp/mermaid-renderer-x/mermaid.html")),
            "file:///tmp/mermaid-renderer-x/mermaid.html"
        );
    }

    #[test]
    fn test_file_url_escapes_special_characters() {
        assert_eq!(
            file_url(Path::new("/tmp/my docs/#1 100%.html")),
            "file:///tmp/my%20docs/%231%20100%25.html"
        );
    }
}
