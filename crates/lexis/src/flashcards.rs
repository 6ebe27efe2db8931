//! Random flashcard draws.

use lexis_db::{LexisDb, PackId, Result, Vocab, VocabId};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;

pub const DEFAULT_LIMIT: usize = 20;
pub const MAX_LIMIT: usize = 100;

/// Number of cards to draw, always within `1..=MAX_LIMIT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlashcardLimit(usize);

impl FlashcardLimit {
    /// Non-positive values fall back to the default; large values clamp.
    pub fn new(requested: i64) -> Self {
        if requested <= 0 {
            Self::default()
        } else {
            Self(usize::try_from(requested).map_or(MAX_LIMIT, |n| n.min(MAX_LIMIT)))
        }
    }

    /// Parse a raw query value; absent or non-numeric input gives the default.
    pub fn parse(raw: Option<&str>) -> Self {
        raw.map(str::trim)
            .and_then(|s| s.parse::<i64>().ok())
            .map_or_else(Self::default, Self::new)
    }

    pub fn get(self) -> usize {
        self.0
    }
}

impl Default for FlashcardLimit {
    fn default() -> Self {
        Self(DEFAULT_LIMIT)
    }
}

/// One card as shown to a learner; the translation stays hidden.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Flashcard {
    pub id: VocabId,
    pub image: String,
    pub name: String,
    pub pack_name: String,
}

/// Shuffle `vocabs` uniformly and keep at most `limit` of them.
pub fn sample<R: Rng + ?Sized>(
    mut vocabs: Vec<Vocab>,
    limit: FlashcardLimit,
    rng: &mut R,
) -> Vec<Vocab> {
    vocabs.shuffle(rng);
    vocabs.truncate(limit.get());
    vocabs
}

/// Turn drawn vocabs into cards, looking up each distinct pack once.
pub async fn label(db: &LexisDb, vocabs: Vec<Vocab>) -> Result<Vec<Flashcard>> {
    let mut pack_names: HashMap<PackId, String> = HashMap::new();
    for vocab in &vocabs {
        if pack_names.contains_key(&vocab.pack_id) {
            continue;
        }
        let name = db
            .get_pack(&vocab.pack_id)
            .await?
            .map(|pack| pack.name)
            .unwrap_or_default();
        pack_names.insert(vocab.pack_id.clone(), name);
    }

    Ok(vocabs
        .into_iter()
        .map(|vocab| Flashcard {
            pack_name: pack_names.get(&vocab.pack_id).cloned().unwrap_or_default(),
            id: vocab.id,
            image: vocab.image,
            name: vocab.name,
        })
        .collect())
}
