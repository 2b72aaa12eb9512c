use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::parser::{ParsedPage, Section};

/// One faction's RAG database: six buckets, saved as six JSON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FactionDatabase {
    pub meta: MetaBucket,
    pub overview: OverviewBucket,
    pub mechanics: MechanicsBucket,
    pub legendary_lords: LordsBucket,
    pub units: UnitsBucket,
    pub additional: AdditionalBucket,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetaBucket {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
    pub faction_type: String,
    pub playstyle: Vec<String>,
    pub difficulty: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub keywords: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverviewBucket {
    pub faction_id: String,
    pub name: String,
    pub background: String,
    pub how_to_play: String,
    pub key_features: Vec<String>,
}

/// A classified section: its cleaned prose plus any bullet items.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entry {
    pub description: String,
    pub details: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MechanicsBucket {
    pub faction_id: String,
    pub unique_mechanics: IndexMap<String, Entry>,
    pub general_mechanics: IndexMap<String, Entry>,
    pub magic: IndexMap<String, Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LordsBucket {
    pub faction_id: String,
    pub factions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitsBucket {
    pub faction_id: String,
    pub roster_info: IndexMap<String, Entry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdditionalBucket {
    pub faction_id: String,
    pub other_information: IndexMap<String, Entry>,
}

const HOW_TO_PLAY_HEADERS: &[&str] = &["How to play", "How They Play", "How they play"];
const GENERAL_KEYWORDS: &[&str] = &["building", "tech", "commandment", "settlement"];
const UNIT_KEYWORDS: &[&str] = &["unit", "roster", "army"];

/// Classify a parsed page's sections into the six database buckets.
/// Pure policy over already-clean parser output; no markup handling
/// happens here.
pub fn build(page: &ParsedPage, config: &Config) -> FactionDatabase {
    let meta_info = config.faction_meta.get(&page.id).cloned().unwrap_or_default();

    let background = page
        .sections
        .get("Background")
        .map(|s| s.content.clone())
        .unwrap_or_default();

    let description = if background.chars().count() > 200 {
        let head: String = background.chars().take(200).collect();
        format!("{}...", head)
    } else {
        background.clone()
    };

    let faction_type = if meta_info.faction_type.is_empty() {
        "unknown".to_string()
    } else {
        meta_info.faction_type.clone()
    };

    let mut tags = vec![page.id.clone(), faction_type.clone(), "base_game".to_string()];
    tags.extend(meta_info.playstyle.iter().cloned());

    let meta = MetaBucket {
        id: page.id.clone(),
        name: page.name.clone(),
        kind: "faction".to_string(),
        description,
        faction_type,
        playstyle: meta_info.playstyle.clone(),
        difficulty: if meta_info.difficulty.is_empty() {
            "medium".to_string()
        } else {
            meta_info.difficulty.clone()
        },
        strengths: meta_info.strengths.clone(),
        weaknesses: meta_info.weaknesses.clone(),
        keywords: meta_info.keywords.clone(),
        tags,
    };

    let how_to_play = HOW_TO_PLAY_HEADERS
        .iter()
        .find_map(|h| page.sections.get(*h));

    let overview = OverviewBucket {
        faction_id: page.id.clone(),
        name: page.name.clone(),
        background,
        how_to_play: how_to_play.map(|s| s.content.clone()).unwrap_or_default(),
        key_features: how_to_play
            .and_then(|s| s.list_items.clone())
            .unwrap_or_default(),
    };

    let mut mechanics = MechanicsBucket {
        faction_id: page.id.clone(),
        unique_mechanics: IndexMap::new(),
        general_mechanics: IndexMap::new(),
        magic: IndexMap::new(),
    };

    for (name, section) in &page.sections {
        if !config.is_game_content(name) || is_empty(section) {
            continue;
        }
        let lower = name.to_lowercase();
        if lower.contains("unique") && lower.contains("mechanic") {
            mechanics.unique_mechanics.insert(name.clone(), entry(section));
        } else if GENERAL_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            mechanics.general_mechanics.insert(name.clone(), entry(section));
        } else if lower.contains("magic") || lower.contains("lore") {
            mechanics.magic.insert(name.clone(), entry(section));
        }
    }

    let factions = page
        .sections
        .get("Playable factions")
        .and_then(|s| s.list_items.clone())
        .unwrap_or_default()
        .into_iter()
        .filter(|line| !config.dlc_lords.iter().any(|dlc| line.contains(dlc)))
        .filter(|line| line.chars().count() > 5)
        .collect();

    let legendary_lords = LordsBucket {
        faction_id: page.id.clone(),
        factions,
    };

    let mut units = UnitsBucket {
        faction_id: page.id.clone(),
        roster_info: IndexMap::new(),
    };
    for (name, section) in &page.sections {
        if !config.is_game_content(name) || is_empty(section) {
            continue;
        }
        let lower = name.to_lowercase();
        if UNIT_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
            units.roster_info.insert(name.clone(), entry(section));
        }
    }

    // Everything game-relevant not already bucketed lands in additional.
    let mut additional = AdditionalBucket {
        faction_id: page.id.clone(),
        other_information: IndexMap::new(),
    };
    let named_elsewhere = ["Background", "How to play", "How They Play", "Playable factions"];
    for (name, section) in &page.sections {
        if named_elsewhere.contains(&name.as_str())
            || mechanics.unique_mechanics.contains_key(name)
            || mechanics.general_mechanics.contains_key(name)
            || mechanics.magic.contains_key(name)
            || units.roster_info.contains_key(name)
        {
            continue;
        }
        if !config.is_game_content(name) || is_empty(section) {
            continue;
        }
        additional.other_information.insert(name.clone(), entry(section));
    }

    FactionDatabase {
        meta,
        overview,
        mechanics,
        legendary_lords,
        units,
        additional,
    }
}

fn entry(section: &Section) -> Entry {
    Entry {
        description: section.content.clone(),
        details: section.list_items.clone().unwrap_or_default(),
    }
}

fn is_empty(section: &Section) -> bool {
    section.content.is_empty() && section.list_items.as_ref().map_or(true, |v| v.is_empty())
}
