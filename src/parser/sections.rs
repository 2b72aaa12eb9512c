use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

static HEADER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^==+\s*(.+?)\s*==+").unwrap());

/// Split a page body into named sections on `== Header ==` lines.
///
/// All heading depths are treated the same, so sub-sections become
/// siblings. Text before the first header is discarded. A repeated
/// header overwrites the earlier section's body (last-wins) while the
/// key keeps its first-occurrence position in the map.
pub fn split_sections(content: &str) -> IndexMap<String, String> {
    let mut sections: IndexMap<String, String> = IndexMap::new();
    let mut current: Option<String> = None;
    let mut lines: Vec<&str> = Vec::new();

    for line in content.split('\n') {
        if let Some(caps) = HEADER_RE.captures(line) {
            if let Some(name) = current.take() {
                sections.insert(name, lines.join("\n").trim().to_string());
            }
            current = Some(caps[1].trim().to_string());
            lines.clear();
        } else if current.is_some() {
            lines.push(line);
        }
    }

    if let Some(name) = current {
        sections.insert(name, lines.join("\n").trim().to_string());
    }

    sections
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_in_document_order() {
        let sections = split_sections("== A ==\nfoo\n== B ==\nbar");
        let keys: Vec<&String> = sections.keys().collect();
        assert_eq!(keys, ["A", "B"]);
        assert_eq!(sections["A"], "foo");
        assert_eq!(sections["B"], "bar");
    }

    #[test]
    fn preamble_is_dropped() {
        let sections = split_sections("intro text\n== A ==\nbody");
        assert_eq!(sections.len(), 1);
        assert_eq!(sections["A"], "body");
    }

    #[test]
    fn depth_is_flattened() {
        let sections = split_sections("== Top ==\na\n=== Sub ===\nb");
        let keys: Vec<&String> = sections.keys().collect();
        assert_eq!(keys, ["Top", "Sub"]);
    }

    #[test]
    fn repeated_header_last_wins() {
        let sections = split_sections("== Units ==\nold\n== Other ==\nx\n== Units ==\nnew");
        assert_eq!(sections["Units"], "new");
        // first-occurrence position is kept
        let keys: Vec<&String> = sections.keys().collect();
        assert_eq!(keys, ["Units", "Other"]);
    }

    #[test]
    fn body_is_joined_and_trimmed() {
        let sections = split_sections("== A ==\n\nline one\nline two\n\n");
        assert_eq!(sections["A"], "line one\nline two");
    }

    #[test]
    fn no_headers_yields_empty() {
        assert!(split_sections("just prose, no headers").is_empty());
    }
}
