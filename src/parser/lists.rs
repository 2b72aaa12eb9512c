use super::markup::clean_markup;

/// Pull bullet lines (`* item`) out of a raw section body as cleaned
/// strings, in line order. Exactly one leading marker is stripped, so a
/// nested `** item` keeps its remaining marker in the text. Non-bullet
/// lines are skipped entirely; continuation lines of a wrapped bullet
/// are lost with them.
pub fn extract_list_items(text: &str) -> Vec<String> {
    let mut items = Vec::new();
    for line in text.split('\n') {
        let trimmed = line.trim();
        if let Some(rest) = trimmed.strip_prefix('*') {
            let item = clean_markup(rest.trim());
            if !item.is_empty() {
                items.push(item);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullets_in_order_non_bullets_skipped() {
        let items = extract_list_items("* one\nnot a bullet\n* two");
        assert_eq!(items, ["one", "two"]);
    }

    #[test]
    fn items_are_cleaned() {
        let items = extract_list_items("* [[Spearmen|Cathayan Spearmen]]\n* '''Archers'''");
        assert_eq!(items, ["Cathayan Spearmen", "Archers"]);
    }

    #[test]
    fn empty_after_cleaning_is_dropped() {
        let items = extract_list_items("* {{IconTemplate}}\n* kept");
        assert_eq!(items, ["kept"]);
    }

    #[test]
    fn no_bullets_yields_empty() {
        assert!(extract_list_items("prose only\nmore prose").is_empty());
    }
}
