/// Mention resolver — which known characters a piece of text names.

use crate::core::registry::CharacterRegistry;
use crate::core::tagger::strip_punctuation;
use crate::schema::mention::MentionSet;

/// Resolve the characters mentioned in `text`.
///
/// Two passes feed one ordered set: every whitespace token (punctuation
/// stripped) is looked up verbatim, then every multi-word name is
/// searched as a raw substring of the lowercased text.
pub fn resolve(text: &str, registry: &CharacterRegistry) -> MentionSet {
    let mut mentions = MentionSet::new();

    for token in text.split_whitespace() {
        let token = strip_punctuation(token);
        if let Some(id) = registry.lookup(&token) {
            mentions.insert(id.clone());
        }
    }

    let lowered = text.to_lowercase();
    for (name, id) in registry.multi_word_names() {
        if lowered.contains(name) {
            mentions.insert(id.clone());
        }
    }

    mentions
}
