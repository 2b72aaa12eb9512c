pub mod infobox;
pub mod lists;
pub mod markup;
pub mod sections;

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named span of the page body, cleaned. `list_items` is `None` when
/// the raw section held no bullet lines at all; serialization omits the
/// field so downstream readers can tell "no list" from an empty one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Section {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub list_items: Option<Vec<String>>,
}

/// One fully parsed wiki page. Built once, serialized, never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParsedPage {
    pub id: String,
    pub name: String,
    pub infobox: BTreeMap<String, String>,
    pub sections: IndexMap<String, Section>,
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("page body is empty")]
    EmptyPage,
}

/// Parse one raw page: infobox once, sections once, then per-section
/// list extraction and markup cleaning over the same raw body.
///
/// Bullet lines become `list_items` and are excluded from `content`,
/// so a section that is nothing but a list has empty content rather
/// than the list text duplicated into it.
///
/// Only an empty body is an error; malformed markup degrades into
/// best-effort cleaned text. Batch callers should skip the failed page
/// and keep going.
pub fn parse_page(raw_body: &str, display_title: &str) -> Result<ParsedPage, ParseError> {
    if raw_body.trim().is_empty() {
        return Err(ParseError::EmptyPage);
    }

    let infobox = infobox::extract_infobox(raw_body);
    let raw_sections = sections::split_sections(raw_body);

    let mut parsed_sections = IndexMap::with_capacity(raw_sections.len());
    for (name, raw) in raw_sections {
        let items = lists::extract_list_items(&raw);
        let prose: Vec<&str> = raw
            .split('\n')
            .filter(|line| !line.trim().starts_with('*'))
            .collect();
        parsed_sections.insert(
            name,
            Section {
                content: markup::clean_markup(&prose.join("\n")),
                list_items: if items.is_empty() { None } else { Some(items) },
            },
        );
    }

    Ok(ParsedPage {
        id: page_id(display_title),
        name: display_title.replace('_', " "),
        infobox,
        sections: parsed_sections,
    })
}

/// Slug for a display title: lowercased, whitespace replaced by `_`.
pub fn page_id(title: &str) -> String {
    title
        .to_lowercase()
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}
