use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;

use crate::builder::FactionDatabase;
use crate::parser::ParsedPage;

/// On-disk layout rooted at `data/`:
/// raw markup, parsed pages, per-faction database buckets, chunk export.
pub struct Store {
    root: PathBuf,
}

impl Store {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Store { root: root.into() }
    }

    pub fn open_default() -> Self {
        Store::new("data")
    }

    fn raw_dir(&self) -> PathBuf {
        self.root.join("raw")
    }

    fn parsed_dir(&self) -> PathBuf {
        self.root.join("parsed")
    }

    fn db_dir(&self) -> PathBuf {
        self.root.join("db")
    }

    pub fn chunks_path(&self) -> PathBuf {
        self.root.join("rag_chunks.json")
    }

    // ── Raw markup ──

    pub fn save_raw(&self, id: &str, markup: &str) -> Result<()> {
        let dir = self.raw_dir();
        fs::create_dir_all(&dir)?;
        let path = dir.join(format!("{}.txt", id));
        fs::write(&path, markup).with_context(|| format!("writing {}", path.display()))
    }

    pub fn has_raw(&self, id: &str) -> bool {
        self.raw_dir().join(format!("{}.txt", id)).exists()
    }

    /// All saved raw pages as (id, markup), sorted by id.
    pub fn load_raw_pages(&self) -> Result<Vec<(String, String)>> {
        let mut pages = Vec::new();
        for path in list_files(&self.raw_dir(), "txt")? {
            let id = file_stem(&path);
            let markup = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            pages.push((id, markup));
        }
        Ok(pages)
    }

    // ── Parsed pages ──

    pub fn save_parsed(&self, page: &ParsedPage) -> Result<()> {
        let dir = self.parsed_dir();
        fs::create_dir_all(&dir)?;
        write_pretty_json(&dir.join(format!("{}.json", page.id)), page)
    }

    pub fn load_parsed_pages(&self) -> Result<Vec<ParsedPage>> {
        let mut pages = Vec::new();
        for path in list_files(&self.parsed_dir(), "json")? {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("reading {}", path.display()))?;
            let page: ParsedPage = serde_json::from_str(&raw)
                .with_context(|| format!("decoding {}", path.display()))?;
            pages.push(page);
        }
        Ok(pages)
    }

    // ── Faction database ──

    /// Six bucket files per faction, mirroring the database layout the
    /// chunk exporter reads back.
    pub fn save_faction_db(&self, db: &FactionDatabase) -> Result<()> {
        let dir = self.db_dir().join(&db.meta.id);
        fs::create_dir_all(&dir)?;
        write_pretty_json(&dir.join("_meta.json"), &db.meta)?;
        write_pretty_json(&dir.join("overview.json"), &db.overview)?;
        write_pretty_json(&dir.join("mechanics.json"), &db.mechanics)?;
        write_pretty_json(&dir.join("legendary_lords.json"), &db.legendary_lords)?;
        write_pretty_json(&dir.join("units.json"), &db.units)?;
        write_pretty_json(&dir.join("additional.json"), &db.additional)?;
        Ok(())
    }

    pub fn save_chunks(&self, chunks: &[crate::chunker::Chunk]) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        write_pretty_json(&self.chunks_path(), &chunks)
    }

    // ── Stats ──

    pub fn stats(&self) -> Result<Stats> {
        let chunks = if self.chunks_path().exists() {
            let raw = fs::read_to_string(self.chunks_path())?;
            serde_json::from_str::<Vec<serde_json::Value>>(&raw)
                .map(|v| v.len())
                .unwrap_or(0)
        } else {
            0
        };
        Ok(Stats {
            raw: list_files(&self.raw_dir(), "txt")?.len(),
            parsed: list_files(&self.parsed_dir(), "json")?.len(),
            built: list_dirs(&self.db_dir())?.len(),
            chunks,
        })
    }
}

pub struct Stats {
    pub raw: usize,
    pub parsed: usize,
    pub built: usize,
    pub chunks: usize,
}

/// Pretty-printed UTF-8 JSON; serde_json leaves non-ASCII verbatim.
fn write_pretty_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))
}

fn list_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.extension().is_some_and(|e| e == extension))
        .collect();
    paths.sort();
    Ok(paths)
}

fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|p| p.is_dir())
        .collect();
    paths.sort();
    Ok(paths)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_page;

    fn temp_store(tag: &str) -> Store {
        let dir = std::env::temp_dir().join(format!("wiki_rag_store_{}_{}", tag, std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        Store::new(dir)
    }

    #[test]
    fn raw_round_trip() {
        let store = temp_store("raw");
        store.save_raw("kislev", "== A ==\ntext").unwrap();
        assert!(store.has_raw("kislev"));
        let pages = store.load_raw_pages().unwrap();
        assert_eq!(pages, vec![("kislev".to_string(), "== A ==\ntext".to_string())]);
    }

    #[test]
    fn parsed_round_trip_preserves_section_order() {
        let store = temp_store("parsed");
        let page = parse_page("== B ==\nfirst\n== A ==\nsecond", "Test_Page").unwrap();
        store.save_parsed(&page).unwrap();
        let loaded = store.load_parsed_pages().unwrap();
        assert_eq!(loaded.len(), 1);
        let keys: Vec<&String> = loaded[0].sections.keys().collect();
        assert_eq!(keys, ["B", "A"]);
    }

    #[test]
    fn pretty_json_keeps_non_ascii() {
        let store = temp_store("utf8");
        let page = parse_page("== Lore ==\nThe dragon Zhao Míng rules.", "Cathay").unwrap();
        store.save_parsed(&page).unwrap();
        let raw = fs::read_to_string(
            store.parsed_dir().join("cathay.json"),
        )
        .unwrap();
        assert!(raw.contains("Zhao Míng"));
        assert!(!raw.contains("\\u"));
        assert!(raw.contains('\n'), "expected pretty-printed output");
    }

    #[test]
    fn stats_on_empty_store() {
        let store = temp_store("empty");
        let stats = store.stats().unwrap();
        assert_eq!(stats.raw, 0);
        assert_eq!(stats.parsed, 0);
        assert_eq!(stats.built, 0);
        assert_eq!(stats.chunks, 0);
    }
}
