use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Static per-faction metadata merged into each page's `_meta.json`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FactionMeta {
    #[serde(default)]
    pub faction_type: String,
    #[serde(default)]
    pub playstyle: Vec<String>,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

/// All classification data the pipeline needs, injected rather than
/// hard-coded so tests can substitute fixtures. `Config::default()`
/// matches the shipped wiki; `Config::load` overrides from a JSON file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MediaWiki api.php endpoint to fetch from.
    pub api_url: String,
    /// Page titles to fetch (underscored wiki form).
    pub pages: Vec<String>,
    /// Lowercased keywords marking a section as wiki housekeeping
    /// rather than game content.
    pub excluded_sections: HashSet<String>,
    /// DLC lord names filtered out of the playable-factions list.
    pub dlc_lords: Vec<String>,
    /// Per-faction metadata keyed by page id.
    pub faction_meta: BTreeMap<String, FactionMeta>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&raw)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// True when a section carries game information rather than
    /// galleries, navigation, references and similar wiki furniture.
    pub fn is_game_content(&self, section_name: &str) -> bool {
        let lower = section_name.to_lowercase();
        if self.excluded_sections.iter().any(|ex| lower.contains(ex.as_str())) {
            return false;
        }
        // Media/embed junk that leaks into header lines
        !lower.contains("[[file:") && !lower.contains("{{#ev:")
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_url: "https://totalwarwarhammer.fandom.com/api.php".to_string(),
            pages: [
                "Grand_Cathay",
                "Kislev",
                "Khorne",
                "Tzeentch",
                "Nurgle",
                "Slaanesh",
                "Daemons_of_Chaos",
                "Ogre_Kingdoms",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            excluded_sections: [
                "art", "artwork", "screenshots", "concept art", "gallery", "images",
                "videos", "trailer", "media",
                "references", "see also", "external links", "sources",
                "trivia", "notes", "in previous games", "history",
                "navigation", "categories", "category",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            dlc_lords: ["Yuan Bo", "Mother Ostankya", "The Changeling", "Dechala"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            faction_meta: default_faction_meta(),
        }
    }
}

fn default_faction_meta() -> BTreeMap<String, FactionMeta> {
    let mut meta = BTreeMap::new();

    let mut insert = |id: &str,
                      faction_type: &str,
                      playstyle: &[&str],
                      difficulty: &str,
                      strengths: &[&str],
                      weaknesses: &[&str],
                      keywords: &[&str]| {
        meta.insert(
            id.to_string(),
            FactionMeta {
                faction_type: faction_type.to_string(),
                playstyle: playstyle.iter().map(|s| s.to_string()).collect(),
                difficulty: difficulty.to_string(),
                strengths: strengths.iter().map(|s| s.to_string()).collect(),
                weaknesses: weaknesses.iter().map(|s| s.to_string()).collect(),
                keywords: keywords.iter().map(|s| s.to_string()).collect(),
            },
        );
    };

    insert(
        "grand_cathay",
        "order",
        &["defensive", "balanced", "ranged"],
        "medium",
        &["Magic", "Ranged units", "Defensive", "Harmony bonuses"],
        &["Mobility", "Dependent on balance"],
        &["dragons", "harmony", "yin", "yang", "cathay", "empire", "defensive"],
    );
    insert(
        "kislev",
        "order",
        &["hybrid", "cavalry", "magic"],
        "medium",
        &["Hybrid units", "Cavalry", "Ice magic", "Versatile"],
        &["No flying units", "Resource dependent"],
        &["bears", "ice", "cavalry", "hybrid", "russia", "cold", "ursun"],
    );
    insert(
        "khorne",
        "chaos",
        &["aggressive", "melee"],
        "easy",
        &["Melee damage", "Aggression", "No magic weakness"],
        &["No ranged", "No magic", "Poor diplomacy"],
        &["blood", "melee", "skulls", "aggressive", "khorne", "chaos", "blood god"],
    );
    insert(
        "tzeentch",
        "chaos",
        &["magic", "ranged", "mobile"],
        "hard",
        &["Magic", "Ranged", "Flying units", "Teleportation"],
        &["Weak melee", "Complex mechanics"],
        &["magic", "scheming", "barriers", "flying", "tzeentch", "chaos", "change"],
    );
    insert(
        "nurgle",
        "chaos",
        &["defensive", "attrition"],
        "medium",
        &["Durability", "Attrition", "Plagues", "Corruption"],
        &["Slow", "Low mobility"],
        &["plague", "slow", "durable", "attrition", "nurgle", "chaos", "decay"],
    );
    insert(
        "slaanesh",
        "chaos",
        &["fast", "aggressive", "melee"],
        "medium",
        &["Speed", "Close combat", "Seduction", "Diplomacy"],
        &["Low armor", "No ranged", "Fragile"],
        &["fast", "seduction", "pleasure", "speed", "slaanesh", "chaos", "excess"],
    );
    insert(
        "daemons_of_chaos",
        "chaos",
        &["versatile", "adaptive"],
        "hard",
        &["Versatile roster", "All god units", "Customizable"],
        &["Complex", "Jack of all trades"],
        &["undivided", "versatile", "daemon prince", "all gods", "chaos", "mixed"],
    );
    insert(
        "ogre_kingdoms",
        "neutral",
        &["monstrous", "mercenary"],
        "easy",
        &["Large units", "Charge bonus", "Camps anywhere"],
        &["No flying", "Expensive units"],
        &["ogres", "monstrous", "camps", "meat", "mercenary", "big", "hungry"],
    );

    meta
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_has_all_base_factions() {
        let config = Config::default();
        assert_eq!(config.pages.len(), 8);
        for page in &config.pages {
            let id = crate::parser::page_id(page);
            assert!(config.faction_meta.contains_key(&id), "missing meta for {}", id);
        }
    }

    #[test]
    fn game_content_filter() {
        let config = Config::default();
        assert!(config.is_game_content("Unique campaign mechanics"));
        assert!(!config.is_game_content("Gallery"));
        assert!(!config.is_game_content("See also"));
        // substring match, case-insensitive
        assert!(!config.is_game_content("Concept Art"));
    }

    #[test]
    fn roundtrips_through_json() {
        let config = Config::default();
        let json = serde_json::to_string(&config).unwrap();
        let back: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pages, config.pages);
        assert_eq!(back.dlc_lords, config.dlc_lords);
    }
}
