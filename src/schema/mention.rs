use serde::{Deserialize, Serialize};
use std::fmt;

use super::character::CharacterId;

/// An ordered set of character IDs: insertion order is kept and
/// duplicates are dropped, keeping the first occurrence.
///
/// Serializes to the `who` attribute format: `#a #b #c`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentionSet {
    ids: Vec<CharacterId>,
}

impl MentionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a whitespace-separated list of `#id` references.
    pub fn from_who(who: &str) -> Self {
        let mut set = Self::new();
        for token in who.split_whitespace() {
            if let Some(id) = CharacterId::from_reference(token) {
                set.insert(id);
            }
        }
        set
    }

    /// Insert an ID. Returns false if it was already present.
    pub fn insert(&mut self, id: CharacterId) -> bool {
        if self.ids.contains(&id) {
            return false;
        }
        self.ids.push(id);
        true
    }

    /// Append every ID of `other` that is not yet present.
    pub fn merge(&mut self, other: &MentionSet) {
        for id in &other.ids {
            self.insert(id.clone());
        }
    }

    /// Drop every ID that also appears in `other`.
    pub fn remove_all(&mut self, other: &MentionSet) {
        self.ids.retain(|id| !other.contains(id));
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.ids.contains(id)
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CharacterId> {
        self.ids.iter()
    }

    /// Serialize as a `who` attribute value.
    pub fn to_who(&self) -> String {
        self.ids
            .iter()
            .map(CharacterId::reference)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Display for MentionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_who())
    }
}

impl FromIterator<CharacterId> for MentionSet {
    fn from_iter<I: IntoIterator<Item = CharacterId>>(iter: I) -> Self {
        let mut set = Self::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl<'a> IntoIterator for &'a MentionSet {
    type Item = &'a CharacterId;
    type IntoIter = std::slice::Iter<'a, CharacterId>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(names: &[&str]) -> MentionSet {
        names.iter().map(|n| CharacterId::new(*n)).collect()
    }

    #[test]
    fn insertion_order_and_dedup() {
        let set = ids(&["karl", "anna", "karl", "franz"]);
        assert_eq!(set.to_who(), "#karl #anna #franz");
        assert_eq!(set.len(), 3);
    }

    #[test]
    fn merge_appends_missing_only() {
        let mut set = ids(&["karl", "anna"]);
        set.merge(&ids(&["anna", "odoardo"]));
        assert_eq!(set.to_who(), "#karl #anna #odoardo");
    }

    #[test]
    fn remove_all_keeps_order_of_the_rest() {
        let mut set = ids(&["karl", "anna", "franz"]);
        set.remove_all(&ids(&["anna"]));
        assert_eq!(set.to_who(), "#karl #franz");
    }

    #[test]
    fn from_who_parses_references() {
        let set = MentionSet::from_who("  #emilia #marinelli   #emilia ");
        assert_eq!(set.to_who(), "#emilia #marinelli");
    }

    #[test]
    fn empty_set_serializes_to_empty_string() {
        assert_eq!(MentionSet::new().to_who(), "");
        assert!(MentionSet::from_who("").is_empty());
    }
}
