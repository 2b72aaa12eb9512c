use std::sync::LazyLock;

use regex::Regex;

static TABLE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?s)\{\|(.*?)\|\}").unwrap());
static CELL_MARKER_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[|!]+").unwrap());
static MAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{Main\|([^}]+)\}\}").unwrap());
static FACTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{The ([^}]+?) faction\}\}").unwrap());
static TEMPLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{\{[^}]+\}\}").unwrap());
static FILE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[(?:File|Image):[^\]]*\]\]").unwrap());
static CATEGORY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[Category:[^\]]*\]\]").unwrap());
static LINK_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\]\]").unwrap());
static EXTERNAL_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[http[^\]]*\]").unwrap());
static BR_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<br\s*/?>").unwrap());
static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]+>").unwrap());
static WS_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Attribute prefixes on table lines that carry no prose.
const STYLE_PREFIXES: &[&str] = &["class=", "style=", "colspan="];

/// Flatten every `{| ... |}` table block into its cell text, joined by
/// single spaces in row-major order. Text outside tables is untouched.
///
/// Single-level only: the first `|}` found closes the block, so nested
/// tables lose their tail.
pub fn flatten_tables(text: &str) -> String {
    TABLE_RE
        .replace_all(text, |caps: &regex::Captures| {
            let mut cells = Vec::new();
            for row in caps[1].split("|-") {
                for line in row.split('\n') {
                    let line = CELL_MARKER_RE.replace(line.trim(), "");
                    let line = line.trim();
                    if line.is_empty() || STYLE_PREFIXES.iter().any(|p| line.starts_with(p)) {
                        continue;
                    }
                    cells.push(line.to_string());
                }
            }
            cells.join(" ")
        })
        .to_string()
}

/// Strip wiki markup down to plain prose.
///
/// Order matters: tables must be flattened before generic template
/// removal (both use brace delimiters), and the `{{Main|...}}` /
/// `{{The ... faction}}` rewrites must run before the catch-all
/// template strip eats them. Idempotent: cleaning clean text is a no-op.
pub fn clean_markup(text: &str) -> String {
    if text.trim().is_empty() {
        return String::new();
    }

    let text = flatten_tables(text);

    // {{Main|X}} -> X
    let text = MAIN_RE.replace_all(&text, "$1");
    // {{The Northern Provinces faction}} -> "The Northern Provinces"
    let text = FACTION_RE.replace_all(&text, "The $1");
    // Remaining templates are dropped wholesale (nearest close brace).
    let text = TEMPLATE_RE.replace_all(&text, "");

    let text = FILE_RE.replace_all(&text, "");
    let text = CATEGORY_RE.replace_all(&text, "");

    // [[Target|Label]] -> Label (text after the last pipe), [[Target]] -> Target
    let text = LINK_RE.replace_all(&text, |caps: &regex::Captures| {
        caps[1].rsplit('|').next().unwrap_or("").to_string()
    });

    let text = EXTERNAL_RE.replace_all(&text, "");

    let text = text.replace("'''", "").replace("''", "");

    let text = BR_RE.replace_all(&text, " ");
    let text = TAG_RE.replace_all(&text, "");

    WS_RE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_flattens_row_major() {
        let raw = "{|\n|-\n| one\n| two\n| three\n|-\n! four\n! five\n| six\n|}";
        let flat = flatten_tables(raw);
        assert_eq!(flat, "one two three four five six");
        assert!(!flat.contains("{|"));
        assert!(!flat.contains("|}"));
    }

    #[test]
    fn table_skips_style_lines() {
        let raw = "{|class=\"wikitable\"\n|-\n|style=\"width:50%\"\n| real cell\n|}";
        assert_eq!(flatten_tables(raw), "real cell");
    }

    #[test]
    fn no_table_is_untouched() {
        let raw = "plain text with | a pipe";
        assert_eq!(flatten_tables(raw), raw);
    }

    #[test]
    fn piped_link_keeps_label() {
        assert_eq!(clean_markup("[[Target|Label]]"), "Label");
    }

    #[test]
    fn bare_link_keeps_target() {
        assert_eq!(clean_markup("[[Target]]"), "Target");
    }

    #[test]
    fn multi_pipe_link_keeps_last_segment() {
        assert_eq!(clean_markup("[[A|B|C]]"), "C");
    }

    #[test]
    fn template_is_stripped() {
        assert_eq!(clean_markup("{{SomeTemplate|arg}}"), "");
    }

    #[test]
    fn main_template_keeps_argument() {
        assert_eq!(clean_markup("{{Main|X}}"), "X");
        assert_eq!(clean_markup("See {{Main|Grand Cathay}} for more"), "See Grand Cathay for more");
    }

    #[test]
    fn faction_template_rewrites() {
        assert_eq!(
            clean_markup("{{The Northern Provinces faction}}"),
            "The Northern Provinces"
        );
    }

    #[test]
    fn file_and_category_links_removed() {
        assert_eq!(clean_markup("a [[File:Map.png|thumb|A map]] b"), "a b");
        assert_eq!(clean_markup("a [[Image:Icon.png]] b"), "a b");
        assert_eq!(clean_markup("a [[Category:Factions]] b"), "a b");
    }

    #[test]
    fn external_link_removed() {
        assert_eq!(clean_markup("see [https://example.com the site] here"), "see here");
    }

    #[test]
    fn emphasis_markers_removed() {
        assert_eq!(clean_markup("The '''Empire''' is ''old''."), "The Empire is old.");
    }

    #[test]
    fn html_tags_removed() {
        assert_eq!(clean_markup("one<br/>two <ref>cite</ref>three"), "one two citethree");
    }

    #[test]
    fn whitespace_collapsed() {
        assert_eq!(clean_markup("  a \n\n  b\tc  "), "a b c");
    }

    #[test]
    fn empty_input_yields_empty() {
        assert_eq!(clean_markup(""), "");
        assert_eq!(clean_markup("   \n  "), "");
    }

    #[test]
    fn idempotent_on_samples() {
        let samples = [
            "The '''Empire''' is [[Old World|old]].",
            "{{Main|X}} and {{Gone}} <br> done",
            "{|\n|-\n| a\n| b\n|}",
            "plain text already clean",
            "",
        ];
        for s in samples {
            let once = clean_markup(s);
            assert_eq!(clean_markup(&once), once, "not idempotent for {:?}", s);
        }
    }
}
