use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;

use super::markup::clean_markup;

static INFOBOX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{\{Infobox[^}]*\n(.*?)\n\}\}").unwrap());
static FIELD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\|(\w+)\s*=\s*(.+)").unwrap());

/// Extract key/value pairs from the page's `{{Infobox ...}}` block.
///
/// Only the first infobox on the page is read; a second one elsewhere is
/// ignored. Values go through the markup cleaner, and pairs whose value
/// cleans to nothing are dropped. No infobox at all is not an error —
/// the result is simply empty.
pub fn extract_infobox(content: &str) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();

    let Some(caps) = INFOBOX_RE.captures(content) else {
        return data;
    };

    for line in caps[1].split('\n') {
        if let Some(field) = FIELD_RE.captures(line) {
            let value = clean_markup(field[2].trim());
            if !value.is_empty() {
                data.insert(field[1].to_string(), value);
            }
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_fields() {
        let raw = "intro\n{{Infobox faction\n|difficulty = Hard\n|leader = [[Miao Ying]]\n}}\nbody";
        let data = extract_infobox(raw);
        assert_eq!(data.get("difficulty").map(String::as_str), Some("Hard"));
        assert_eq!(data.get("leader").map(String::as_str), Some("Miao Ying"));
    }

    #[test]
    fn missing_infobox_is_empty() {
        assert!(extract_infobox("no infobox here").is_empty());
    }

    #[test]
    fn empty_values_are_skipped() {
        let raw = "{{Infobox\n|image = [[File:Logo.png]]\n|name = Kislev\n}}";
        let data = extract_infobox(raw);
        assert!(!data.contains_key("image"));
        assert_eq!(data.get("name").map(String::as_str), Some("Kislev"));
    }

    #[test]
    fn only_first_infobox_is_read() {
        let raw = "{{Infobox\n|a = one\n}}\ntext\n{{Infobox\n|b = two\n}}";
        let data = extract_infobox(raw);
        assert_eq!(data.get("a").map(String::as_str), Some("one"));
        assert!(!data.contains_key("b"));
    }
}
