use serde::{Deserialize, Serialize};
use std::fmt;

/// Newtype wrapper for character IDs, as declared by `xml:id` in the
/// play's person list. Stored without the leading `#`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub String);

impl CharacterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Parse a single `who` token. Accepts both `#karl` and `karl`.
    pub fn from_reference(token: &str) -> Option<Self> {
        let id = token.trim().trim_start_matches('#');
        if id.is_empty() {
            None
        } else {
            Some(Self(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The `#id` form used in `who` attributes.
    pub fn reference(&self) -> String {
        format!("#{}", self.0)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether a person-list entry is a single person or a group
/// (`person` vs `personGrp`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CharacterKind {
    Person,
    Group,
}

/// A dramatis persona as read from the person list: one ID and the raw
/// name texts (`persName` and `name` elements, variants included).
///
/// Names are kept verbatim here; normalization happens when the
/// registry is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: CharacterId,
    pub kind: CharacterKind,
    pub names: Vec<String>,
}

impl Character {
    pub fn new(id: impl Into<String>, names: &[&str]) -> Self {
        Self {
            id: CharacterId::new(id),
            kind: CharacterKind::Person,
            names: names.iter().map(|n| n.to_string()).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_round_trip() {
        let id = CharacterId::new("karl1");
        assert_eq!(id.reference(), "#karl1");
        assert_eq!(CharacterId::from_reference("#karl1"), Some(id.clone()));
        assert_eq!(CharacterId::from_reference("karl1"), Some(id));
    }

    #[test]
    fn empty_reference_is_none() {
        assert_eq!(CharacterId::from_reference("#"), None);
        assert_eq!(CharacterId::from_reference("  "), None);
    }
}
