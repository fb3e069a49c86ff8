/// Character registry — normalized name variant → character ID.

use rustc_hash::FxHashMap;

use crate::core::tagger::{strip_punctuation, PosTagger};
use crate::schema::character::{Character, CharacterId};

/// Lookup table from every normalized name variant to its character.
///
/// Entries keep registration order so scans over the names are
/// deterministic. Re-registering a variant moves it to the new ID but
/// keeps its original position.
#[derive(Debug, Clone, Default)]
pub struct CharacterRegistry {
    entries: Vec<(String, CharacterId)>,
    index: FxHashMap<String, usize>,
}

impl CharacterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the registry from a play's person list.
    pub fn build(characters: &[Character], tagger: &dyn PosTagger) -> Self {
        let mut registry = Self::new();
        for character in characters {
            for name in &character.names {
                let normalized = normalize_name(name, tagger);
                if normalized.is_empty() {
                    continue;
                }
                registry.register(normalized, character.id.clone());
            }
        }
        registry
    }

    /// Register an already-normalized variant. Last registration wins.
    pub fn register(&mut self, name: String, id: CharacterId) {
        match self.index.get(&name) {
            Some(&slot) => self.entries[slot].1 = id,
            None => {
                self.index.insert(name.clone(), self.entries.len());
                self.entries.push((name, id));
            }
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&CharacterId> {
        self.index.get(name).map(|&slot| &self.entries[slot].1)
    }

    /// All variants in registration order.
    pub fn names(&self) -> impl Iterator<Item = (&str, &CharacterId)> {
        self.entries.iter().map(|(name, id)| (name.as_str(), id))
    }

    /// Variants made of more than one word.
    pub fn multi_word_names(&self) -> impl Iterator<Item = (&str, &CharacterId)> {
        self.names().filter(|(name, _)| name.contains(' '))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Lowercase, strip punctuation, collapse whitespace and drop a leading
/// article or pronoun from multi-word names.
pub fn normalize_name(name: &str, tagger: &dyn PosTagger) -> String {
    let cleaned = strip_punctuation(name);
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    let tokens = if tokens.len() > 1 && tagger.first_token_is_function_word(&cleaned) {
        &tokens[1..]
    } else {
        &tokens[..]
    };
    tokens.join(" ")
}
