//! Entity types stored by Lexis.
//!
//! Field names on the wire follow the storage columns (`lang_id`, `user_id`,
//! `pack_id`) so callers rendering JSON need no mapping layer.

use lexis_ids::{PackId, VocabId};
use serde::{Deserialize, Serialize};

use crate::keys::{PackKey, VocabKey};

/// A supported target language (seed data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: String,
    pub name: String,
    /// Short code, e.g. "hi" for Hindi
    pub code: String,
}

/// A named vocabulary collection owned by one user for one language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pack {
    pub id: PackId,
    /// Unique per owner per language, ignoring case
    pub name: String,
    #[serde(rename = "lang_id")]
    pub language_id: String,
    #[serde(rename = "user_id")]
    pub owner_id: String,
    #[serde(default)]
    pub public: bool,
}

impl Pack {
    /// A new private pack with a fresh id.
    pub fn new(
        name: impl Into<String>,
        language_id: impl Into<String>,
        owner_id: impl Into<String>,
    ) -> Self {
        Self {
            id: PackId::new(),
            name: name.into(),
            language_id: language_id.into(),
            owner_id: owner_id.into(),
            public: false,
        }
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn key(&self) -> PackKey {
        PackKey::derive(&self.owner_id, &self.language_id, &self.name)
    }
}

/// One learnable item with its image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocab {
    pub id: VocabId,
    /// Public reference returned by the blob store
    pub image: String,
    pub name: String,
    /// Only persisted when the backing schema has the column
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation: Option<String>,
    pub pack_id: PackId,
}

impl Vocab {
    pub fn new(
        pack_id: PackId,
        name: impl Into<String>,
        image: impl Into<String>,
        translation: Option<String>,
    ) -> Self {
        Self {
            id: VocabId::new(),
            image: image.into(),
            name: name.into(),
            translation,
            pack_id,
        }
    }

    pub fn key(&self) -> VocabKey {
        VocabKey::derive(self.pack_id.as_str(), &self.name)
    }
}

/// Filter for vocab listings across packs.
#[derive(Debug, Clone, Default)]
pub struct VocabFilter {
    pub owner_id: String,
    pub language_id: String,
    /// Restrict to these packs; empty means every pack of the owner/language
    pub pack_ids: Vec<PackId>,
}

impl VocabFilter {
    pub fn new(owner_id: impl Into<String>, language_id: impl Into<String>) -> Self {
        Self {
            owner_id: owner_id.into(),
            language_id: language_id.into(),
            pack_ids: Vec::new(),
        }
    }

    pub fn with_packs(mut self, pack_ids: impl IntoIterator<Item = PackId>) -> Self {
        self.pack_ids.extend(pack_ids);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_serializes_with_storage_field_names() {
        let pack = Pack::new("Kitchen", "1", "u1");
        let json = serde_json::to_value(&pack).unwrap();
        assert_eq!(json["lang_id"], "1");
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["public"], false);
    }

    #[test]
    fn test_vocab_without_translation_omits_field() {
        let vocab = Vocab::new(PackId::new(), "knife", "/files/images/knife.png", None);
        let json = serde_json::to_value(&vocab).unwrap();
        assert!(json.get("translation").is_none());
    }

    #[test]
    fn test_entity_keys_follow_fields() {
        let pack = Pack::new(" Kitchen ", "1", "U1");
        assert_eq!(pack.key().as_str(), Some("u1:1:kitchen"));

        let vocab = Vocab::new(pack.id.clone(), "Knife", "/files/images/knife.png", None);
        assert_eq!(vocab.key(), VocabKey::derive(pack.id.as_str(), "knife"));
    }
}
