/// Stage-set tracking — who is believed to be on stage right now.

use std::fmt;

use crate::schema::character::CharacterId;
use crate::schema::mention::MentionSet;

/// The characters currently on stage within one scene or act.
///
/// Plain set algebra over [`MentionSet`]; order is first arrival.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StageSet {
    present: MentionSet,
}

impl StageSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Union: everyone already present plus the arrivals.
    pub fn add(&mut self, arriving: &MentionSet) {
        self.present.merge(arriving);
    }

    /// Difference: everyone present except the leavers.
    pub fn remove(&mut self, leaving: &MentionSet) {
        self.present.remove_all(leaving);
    }

    /// Replace the whole set, as a scene heading does.
    pub fn replace(&mut self, present: MentionSet) {
        self.present = present;
    }

    pub fn contains(&self, id: &CharacterId) -> bool {
        self.present.contains(id)
    }

    /// True if every member of `mentions` is on stage. Vacuously true
    /// for an empty set.
    pub fn contains_all(&self, mentions: &MentionSet) -> bool {
        mentions.iter().all(|id| self.present.contains(id))
    }

    pub fn is_empty(&self) -> bool {
        self.present.is_empty()
    }

    pub fn len(&self) -> usize {
        self.present.len()
    }

    pub fn members(&self) -> &MentionSet {
        &self.present
    }
}

impl fmt::Display for StageSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.present)
    }
}
