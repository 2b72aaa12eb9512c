use serde::{Deserialize, Serialize};

use crate::builder::{Entry, FactionDatabase};

/// Background prose longer than this is split into two chunks at the
/// sentence midpoint; embedding quality drops on oversized inputs.
const MAX_BACKGROUND_CHARS: usize = 2500;

/// One flat text+metadata record for the embedding index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub text: String,
    pub metadata: ChunkMeta,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkMeta {
    pub faction: String,
    pub faction_name: String,
    pub faction_type: String,
    pub difficulty: String,
    pub playstyle: String,
    pub keywords: String,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
}

/// Flatten one faction's database buckets into chunk records.
pub fn chunk_faction(db: &FactionDatabase) -> Vec<Chunk> {
    let id = &db.meta.id;
    let base = ChunkMeta {
        faction: id.clone(),
        faction_name: db.meta.name.clone(),
        faction_type: db.meta.faction_type.clone(),
        difficulty: db.meta.difficulty.clone(),
        playstyle: db.meta.playstyle.join(","),
        keywords: db.meta.keywords.join(","),
        category: String::new(),
        subcategory: None,
    };
    let meta = |category: &str, subcategory: Option<&str>| ChunkMeta {
        category: category.to_string(),
        subcategory: subcategory.map(|s| s.to_string()),
        ..base.clone()
    };

    let mut chunks = Vec::new();

    // Background, split in two when oversized
    let background = &db.overview.background;
    if !background.is_empty() {
        if background.chars().count() > MAX_BACKGROUND_CHARS {
            let sentences: Vec<&str> = background.split(". ").collect();
            let mid = sentences.len() / 2;
            chunks.push(Chunk {
                id: format!("{}_background_part1", id),
                text: format!("Background - Part 1:\n\n{}.", sentences[..mid].join(". ")),
                metadata: meta("background", None),
            });
            chunks.push(Chunk {
                id: format!("{}_background_part2", id),
                text: format!("Background - Part 2:\n\n{}", sentences[mid..].join(". ")),
                metadata: meta("background", None),
            });
        } else {
            chunks.push(Chunk {
                id: format!("{}_background", id),
                text: format!("Background:\n\n{}", background),
                metadata: meta("background", None),
            });
        }
    }

    // Gameplay: how-to-play prose plus key features
    let mut gameplay = Vec::new();
    if !db.overview.how_to_play.is_empty() {
        gameplay.push(format!("How to Play:\n\n{}", db.overview.how_to_play));
    }
    if !db.overview.key_features.is_empty() {
        gameplay.push(format!(
            "Key Features:\n- {}",
            db.overview.key_features.join("\n- ")
        ));
    }
    if !gameplay.is_empty() {
        chunks.push(Chunk {
            id: format!("{}_gameplay", id),
            text: gameplay.join("\n\n"),
            metadata: meta("gameplay", None),
        });
    }

    for (name, entry) in &db.mechanics.unique_mechanics {
        if let Some(text) = entry_text(&format!("Unique Mechanic: {}", name), entry, "Features") {
            chunks.push(Chunk {
                id: format!("{}_mechanic_{}", id, chunks.len()),
                text,
                metadata: meta("mechanics", Some("unique")),
            });
        }
    }

    for (name, entry) in &db.mechanics.general_mechanics {
        if let Some(text) = entry_text(&format!("General Mechanic: {}", name), entry, "Details") {
            chunks.push(Chunk {
                id: format!("{}_mechanic_{}", id, chunks.len()),
                text,
                metadata: meta("mechanics", Some("general")),
            });
        }
    }

    for (name, entry) in &db.mechanics.magic {
        if let Some(text) = entry_text(&format!("Magic: {}", name), entry, "Lores of Magic") {
            chunks.push(Chunk {
                id: format!("{}_magic_{}", id, chunks.len()),
                text,
                metadata: meta("magic", None),
            });
        }
    }

    for (name, entry) in &db.units.roster_info {
        if let Some(text) = entry_text(&format!("Unit Roster: {}", name), entry, "Unit Types") {
            chunks.push(Chunk {
                id: format!("{}_units_{}", id, chunks.len()),
                text,
                metadata: meta("units", None),
            });
        }
    }

    let factions: Vec<&String> = db
        .legendary_lords
        .factions
        .iter()
        .filter(|f| !f.trim().is_empty())
        .collect();
    if !factions.is_empty() {
        let mut text = format!("Playable Factions for {}:\n\n", db.meta.name);
        text.push_str(
            &factions
                .iter()
                .map(|f| format!("- {}", f))
                .collect::<Vec<_>>()
                .join("\n"),
        );
        chunks.push(Chunk {
            id: format!("{}_factions", id),
            text,
            metadata: meta("factions", None),
        });
    }

    chunks
}

/// Title + description + labelled bullet list; None when the entry has
/// neither prose nor items.
fn entry_text(title: &str, entry: &Entry, list_label: &str) -> Option<String> {
    if entry.description.is_empty() && entry.details.is_empty() {
        return None;
    }
    let mut parts = vec![title.to_string()];
    if !entry.description.is_empty() {
        parts.push(entry.description.clone());
    }
    if !entry.details.is_empty() {
        parts.push(format!("{}:\n- {}", list_label, entry.details.join("\n- ")));
    }
    Some(parts.join("\n\n"))
}
