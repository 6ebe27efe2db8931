//! Composite uniqueness keys for packs and vocabs.
//!
//! A key is built from trimmed, lowercased components joined with `:`. Any
//! component that is empty after trimming makes the whole key invalid, and an
//! invalid key never matches a stored row. `%` and `:` inside a component are
//! percent-escaped so distinct component tuples cannot render to the same key.

use std::fmt;

const SEPARATOR: char = ':';

/// Normalized (owner, language, name) key of a pack.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PackKey(Option<String>);

/// Normalized (pack, name) key of a vocab.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VocabKey(Option<String>);

impl PackKey {
    pub fn derive(owner_id: &str, language_id: &str, name: &str) -> Self {
        Self(join_components(&[owner_id, language_id, name]))
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    /// The rendered key, or `None` when a component was empty.
    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl VocabKey {
    pub fn derive(pack_id: &str, name: &str) -> Self {
        Self(join_components(&[pack_id, name]))
    }

    pub fn is_valid(&self) -> bool {
        self.0.is_some()
    }

    pub fn as_str(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

impl fmt::Display for PackKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("<invalid>"))
    }
}

impl fmt::Display for VocabKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or("<invalid>"))
    }
}

fn join_components(parts: &[&str]) -> Option<String> {
    let mut key = String::new();
    for (i, part) in parts.iter().enumerate() {
        let normalized = normalize_component(part)?;
        if i > 0 {
            key.push(SEPARATOR);
        }
        key.push_str(&normalized);
    }
    Some(key)
}

fn normalize_component(part: &str) -> Option<String> {
    let trimmed = part.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(trimmed.len());
    for ch in trimmed.to_lowercase().chars() {
        match ch {
            '%' => out.push_str("%25"),
            SEPARATOR => out.push_str("%3A"),
            other => out.push(other),
        }
    }
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pack_key_lowercases_every_component() {
        let cases = [
            ("User1", "EN", "Starter", "user1:en:starter"),
            ("ADMIN", "De", "Pro", "admin:de:pro"),
            ("u1", "1", "Kitchen", "u1:1:kitchen"),
        ];
        for (owner, lang, name, expected) in cases {
            assert_eq!(PackKey::derive(owner, lang, name).as_str(), Some(expected));
        }
    }

    #[test]
    fn test_pack_key_ignores_surrounding_whitespace_and_case() {
        let messy = PackKey::derive("  U1 ", "\t1", " KITCHEN  ");
        let clean = PackKey::derive("u1", "1", "kitchen");
        assert_eq!(messy, clean);
        assert_eq!(
            PackKey::derive(" u1 ", " 1 ", "Kitchen"),
            PackKey::derive("u1", "1", &"Kitchen".to_lowercase())
        );
    }

    #[test]
    fn test_empty_component_invalidates_key() {
        assert!(!PackKey::derive("", "", "").is_valid());
        assert!(!PackKey::derive("u1", "   ", "kitchen").is_valid());
        assert!(!VocabKey::derive("pack", "").is_valid());
        assert_eq!(PackKey::derive("u1", "1", " ").to_string(), "<invalid>");
    }

    #[test]
    fn test_separator_inside_component_is_escaped() {
        let a = PackKey::derive("a:b", "c", "d");
        let b = PackKey::derive("a", "b:c", "d");
        assert_ne!(a, b);
        assert_eq!(a.as_str(), Some("a%3Ab:c:d"));
        assert_eq!(VocabKey::derive("p", "50%").as_str(), Some("p:50%25"));
    }

    #[test]
    fn test_inner_whitespace_is_preserved() {
        let key = VocabKey::derive("pack-1", "  Bread Knife ");
        assert_eq!(key.as_str(), Some("pack-1:bread knife"));
    }

    #[test]
    fn test_unicode_names_fold_case() {
        assert_eq!(
            VocabKey::derive("p", "ÄPFEL"),
            VocabKey::derive("p", "äpfel")
        );
    }
}
