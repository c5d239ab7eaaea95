//! Reference extraction: finds target-domain article URLs in free text

use regex::Regex;
use std::sync::LazyLock;

/// Domain whose articles get archived
pub const TARGET_DOMAIN: &str = "bild.de";

static REFERENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    let domain = regex::escape(TARGET_DOMAIN);
    Regex::new(&format!(r"https?://(?:www|m)\.{domain}/[-a-zA-Z0-9/_.?=,]+")).expect("valid regex")
});

/// Extract target-domain URLs from `text` in order of appearance.
///
/// A match directly preceded by `/` is dropped: that is a URL embedded as a
/// path segment of another URL (e.g. `https://archive.is/https://www.bild.de/...`).
/// Repeated URLs are kept.
pub fn extract_references(text: &str) -> Vec<String> {
    let mut references = Vec::new();
    let mut pos = 0;
    while let Some(m) = REFERENCE_RE.find_at(text, pos) {
        if m.start() > 0 && text.as_bytes()[m.start() - 1] == b'/' {
            // A rejected match must not swallow a URL starting inside it
            pos = m.start() + 1;
            continue;
        }
        references.push(m.as_str().to_string());
        pos = m.end();
    }
    references
}
