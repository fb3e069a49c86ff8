/// Part-of-speech capability used by the registry and the classifier.
///
/// Only two questions are ever asked: does a name start with a
/// determiner/pronoun, and does a sentence contain a verb. The trait
/// keeps the engine independent of whichever tagger answers them.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LexiconError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

pub trait PosTagger: Send + Sync {
    /// True if `text` has more than one token and its first token is a
    /// determiner or pronoun ("der alte moor", "ein bedienter").
    fn first_token_is_function_word(&self, text: &str) -> bool;

    /// True if any token of `sentence` is a verb.
    fn has_verb(&self, sentence: &str) -> bool;
}

/// Inflection endings tried after a known verb stem.
const FINITE_ENDINGS: &[&str] = &["e", "st", "t", "et", "en", "n", "end"];

/// Past participle endings after a `ge-` prefix ("gesetzt", "gesehen").
const PARTICIPLE_ENDINGS: &[&str] = &["t", "et", "en"];

/// Separable prefixes that may precede a stem in one token ("abgeht").
const SEPARABLE_PREFIXES: &[&str] = &[
    "ab", "an", "auf", "aus", "bei", "ein", "fort", "heran", "herein", "heraus", "herbei",
    "hervor", "hin", "hinaus", "hinein", "mit", "nach", "vor", "vorbei", "weg", "zu", "zurück",
];

const FUNCTION_WORDS: &[&str] = &[
    "der", "die", "das", "den", "dem", "des", "ein", "eine", "einer", "eines", "einem", "einen",
    "kein", "keine", "keiner", "keines", "keinem", "keinen", "dieser", "diese", "dieses",
    "diesem", "diesen", "jener", "jene", "jenes", "jenem", "jenen", "mein", "meine", "dein",
    "deine", "sein", "seine", "ihr", "ihre", "unser", "unsere", "euer", "eure", "er", "sie",
    "es", "ich", "du", "wir", "man", "sich", "alle", "beide", "einige", "mehrere", "viele",
    "andere", "jemand", "niemand", "welche", "welcher",
];

/// Auxiliaries and modals. Never counted as verbs: "Karl ist im
/// Zimmer" is still a verbless cast line.
const AUXILIARIES: &[&str] = &[
    "ist", "sind", "war", "waren", "bin", "bist", "sei", "seid", "wäre", "hat", "haben",
    "hatte", "hatten", "habe", "wird", "werden", "wurde", "wurden", "will", "wollen", "kann",
    "können", "muss", "muß", "müssen", "soll", "sollen", "darf", "mag",
];

/// Full forms the stem rules would miss: strong-verb forms with stem
/// vowel changes.
const VERB_FORMS: &[&str] = &[
    "tritt", "trat",
    "traten", "getreten", "kömmt", "kam", "kamen", "gekommen", "ging", "gingen", "gegangen",
    "sieht", "sah", "spricht", "sprach", "nimmt", "nahm", "gibt", "gab", "läuft", "lief",
    "fällt", "fiel", "hält", "hielt", "bleibt", "blieb", "stand", "saß", "lag", "zog",
    "schlägt", "eilt", "flieht", "floh", "liest", "wirft", "warf", "weint", "stürzt",
];

const VERB_STEMS: &[&str] = &[
    "geh", "komm", "steh", "sitz", "lieg", "sag", "sprech", "seh", "hör", "schweig", "halt",
    "nehm", "geb", "zeig", "leg", "setz", "stell", "lauf", "ruf", "folg", "wend", "kehr",
    "tret", "eil", "stürz", "flieh", "führ", "bring", "zieh", "schlag", "fall", "kni",
    "lach", "wein", "blick", "schau", "wink", "les", "schreib", "reich", "umarm", "küss",
    "fass", "greif", "spring", "wart", "bleib", "nah", "entfern", "renn", "schleich", "öffn",
    "schließ", "trag", "werf", "heb", "sink", "seufz", "zitter", "betracht", "umfass",
];

/// A closed-lexicon German tagger.
///
/// Function words, auxiliaries and verb forms are listed explicitly;
/// other verbs are recognized as a known stem plus an inflection
/// ending, optionally behind a separable prefix, or as `ge-` + stem +
/// participle ending.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconTagger {
    #[serde(default)]
    pub function_words: FxHashSet<String>,
    #[serde(default)]
    pub auxiliaries: FxHashSet<String>,
    #[serde(default)]
    pub verbs: FxHashSet<String>,
    #[serde(default)]
    pub verb_stems: FxHashSet<String>,
}

impl LexiconTagger {
    /// The built-in German lexicon.
    pub fn german() -> Self {
        Self {
            function_words: FUNCTION_WORDS.iter().map(|w| w.to_string()).collect(),
            auxiliaries: AUXILIARIES.iter().map(|w| w.to_string()).collect(),
            verbs: VERB_FORMS.iter().map(|w| w.to_string()).collect(),
            verb_stems: VERB_STEMS.iter().map(|w| w.to_string()).collect(),
        }
    }

    /// Load a lexicon from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<LexiconTagger, LexiconError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a lexicon from a RON string.
    pub fn parse_ron(input: &str) -> Result<LexiconTagger, LexiconError> {
        let mut lexicon: LexiconTagger = ron::from_str(input)?;
        lexicon.normalize();
        Ok(lexicon)
    }

    /// Merge another lexicon into this one (set union per word class).
    pub fn merge(&mut self, other: LexiconTagger) {
        self.function_words.extend(other.function_words);
        self.auxiliaries.extend(other.auxiliaries);
        self.verbs.extend(other.verbs);
        self.verb_stems.extend(other.verb_stems);
    }

    fn normalize(&mut self) {
        for set in [
            &mut self.function_words,
            &mut self.auxiliaries,
            &mut self.verbs,
            &mut self.verb_stems,
        ] {
            *set = set.drain().map(|w| w.to_lowercase()).collect();
        }
    }

    /// Returns true if a single lowercased token looks like a verb.
    pub fn is_verb(&self, token: &str) -> bool {
        if token.is_empty()
            || self.function_words.contains(token)
            || self.auxiliaries.contains(token)
        {
            return false;
        }
        if self.verbs.contains(token) {
            return true;
        }
        if self.matches_stem(token) {
            return true;
        }
        if self.is_participle(token) {
            return true;
        }
        SEPARABLE_PREFIXES.iter().any(|prefix| {
            token.strip_prefix(prefix).is_some_and(|rest| {
                self.verbs.contains(rest) || self.matches_stem(rest) || self.is_participle(rest)
            })
        })
    }

    /// `ge` + stem + `t`/`et`/`en`. Nouns like "Gefolge" or "Gesetze"
    /// end differently and stay out.
    fn is_participle(&self, token: &str) -> bool {
        token.strip_prefix("ge").is_some_and(|rest| {
            PARTICIPLE_ENDINGS.iter().any(|ending| {
                rest.strip_suffix(ending)
                    .is_some_and(|stem| self.verb_stems.contains(stem))
            })
        })
    }

    fn matches_stem(&self, token: &str) -> bool {
        FINITE_ENDINGS.iter().any(|ending| {
            token
                .strip_suffix(ending)
                .is_some_and(|stem| self.verb_stems.contains(stem))
        })
    }
}

impl PosTagger for LexiconTagger {
    fn first_token_is_function_word(&self, text: &str) -> bool {
        let tokens: Vec<String> = tokenize(text).collect();
        tokens.len() > 1 && self.function_words.contains(&tokens[0])
    }

    fn has_verb(&self, sentence: &str) -> bool {
        tokenize(sentence).any(|token| self.is_verb(&token))
    }
}

/// Whitespace tokens, lowercased, with ASCII punctuation stripped.
/// Tokens that were pure punctuation are dropped.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split_whitespace()
        .map(strip_punctuation)
        .filter(|t| !t.is_empty())
}

/// Lowercase and remove every ASCII punctuation character.
pub fn strip_punctuation(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_punctuation())
        .flat_map(char::to_lowercase)
        .collect()
}
