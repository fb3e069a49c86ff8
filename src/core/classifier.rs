/// Movement classifier — decides whether a stage-direction sentence is
/// an entrance, an exit, the ambiguous "allein", or nothing.
///
/// The rules form one ordered table. Evaluation stops at the first rule
/// that fires; a veto on that rule turns the sentence into `None`
/// instead of falling through to later rules.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::core::mentions::resolve;
use crate::core::registry::CharacterRegistry;
use crate::core::tagger::PosTagger;
use crate::schema::mention::MentionSet;
use crate::schema::movement::MovementKind;

/// Modal "will": intended rather than performed movement.
static INTENT_VETO: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bwill\b").unwrap());

/// Manner and address words that make a verbless name list a speech
/// cue rather than an arrival ("leise zu Anna").
static MANNER_VETO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\blaut\b|\bleise\b|\bgegen\b|\bentgegen\b|\bweisend\b").unwrap());
static ADDRESS_ZU: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bzu[mr]?\b").unwrap());
static ON_HORSEBACK: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\s+pferd").unwrap());

/// One row of the rule table.
pub struct MovementRule {
    pub id: &'static str,
    pub kind: MovementKind,
    pattern: Regex,
    /// The rule does not fire if this also matches.
    unless: Option<Regex>,
    /// The rule fires but its result is suppressed if this matches.
    veto: Option<&'static Lazy<Regex>>,
}

impl MovementRule {
    fn new(id: &'static str, kind: MovementKind, pattern: &str) -> Self {
        Self {
            id,
            kind,
            pattern: Regex::new(pattern).unwrap(),
            unless: None,
            veto: Some(&INTENT_VETO),
        }
    }

    fn unless(mut self, pattern: &str) -> Self {
        self.unless = Some(Regex::new(pattern).unwrap());
        self
    }

    fn without_veto(mut self) -> Self {
        self.veto = None;
        self
    }

    pub fn matches(&self, sentence: &str) -> bool {
        self.pattern.is_match(sentence)
            && !self.unless.as_ref().is_some_and(|u| u.is_match(sentence))
    }

    pub fn is_vetoed(&self, sentence: &str) -> bool {
        self.veto.is_some_and(|v| v.is_match(sentence))
    }
}

/// Entrance rules first, then exit rules, then "allein".
pub static RULES: Lazy<Vec<MovementRule>> = Lazy::new(|| {
    use MovementKind::{Alone, Entrance, Exit};
    vec![
        MovementRule::new(
            "tritt-auf",
            Entrance,
            r"\b(?:tritt|treten)\b.{0,20}\b(?:herein|auf|vor|zu|ein|hervor)\b|\b(?:herein|auf|vor|zu|ein|hervor).{0,20}(?:tritt|treten)\b",
        ),
        MovementRule::new(
            "kommend",
            Entrance,
            r"\bkommend\b|\beintretend\b|\bhereinstürzend\b",
        ),
        MovementRule::new(
            "tritt-aus",
            Entrance,
            r"\baus\b.{0,20}\btritt\b|\btritt\b.{0,20}\baus\b",
        ),
        MovementRule::new(
            "kommt",
            Entrance,
            r"\bgesprungen\b|\bk[oö]mm(?:en|t)\b|\bgelaufen\b|\bgeführt\b",
        ),
        MovementRule::new("betritt", Entrance, r"\bbetr(?:eten|itt)\b"),
        MovementRule::new("naht", Entrance, r"\bnah(?:en|t)\b"),
        MovementRule::new(
            "stürzt-herein",
            Entrance,
            r"\bstürz.{0,3}\b.*\b(?:herein|auf|hervor)\b|\b(?:herein|auf|hervor).{0,20}stürz.{0,3}\b",
        ),
        MovementRule::new(
            "geht-ab",
            Exit,
            r"\b(?:ab|herein|ins?|hinein|hinaus)\b.{0,20}\bgeh(?:t|en|n)\b|\bgeh(?:t|en|n)\b.{0,20}\b(?:ab|herein|ins?|hinein|hinaus)\b|\babgeh(?:t|en|n)\b",
        ),
        MovementRule::new("fort", Exit, r"\b(?:fort|vorbei|hinaus)\b"),
        MovementRule::new("führt-ab", Exit, r"\bführt\b.{0,20}\bab\b|\bab.{0,20}führt\b"),
        MovementRule::new(
            "stürzt-in",
            Exit,
            r"\bstürzt\b.{0,20}\bin\b|\bin\b.{0,20}\bstürzt\b",
        ),
        MovementRule::new(
            "entfernt-sich",
            Exit,
            r"\bentfern.*\bsich\b|\bsich\b.{0,20}\bentfern",
        ),
        MovementRule::new("ab", Exit, r"\bab\.?$").unless(r"\bauf und ab\.?$"),
        MovementRule::new(
            "rennt-davon",
            Exit,
            r"\brennt\b.{0,20}\b(?:davon|hinaus)\b|\b(?:davon|hinaus)\b.{0,20}\brennt\b",
        ),
        MovementRule::new("flieht", Exit, r"\bflieh(?:t|en)\b"),
        MovementRule::new("geht", Exit, r"^.{0,20}\bgeh(?:t|en|n)\b\.?$"),
        MovementRule::new("nacheilend", Exit, r"\bnacheilend\b"),
        MovementRule::new("eilt-ab", Exit, r"\beil(?:t|en)\b.{0,20}\bab\b"),
        MovementRule::new("allein", Alone, r"^\ballein\b\.?$").without_veto(),
    ]
});

/// Rule id reported for verbless name lists.
pub const VERBLESS_RULE: &str = "verbless-names";

/// The outcome for one sentence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: MovementKind,
    /// The rule that fired, if any, including vetoed ones.
    pub rule: Option<&'static str>,
    pub vetoed: bool,
    /// Characters named in the sentence. Empty for `None`.
    pub mentions: MentionSet,
}

impl Classification {
    fn none() -> Self {
        Self {
            kind: MovementKind::None,
            rule: None,
            vetoed: false,
            mentions: MentionSet::new(),
        }
    }

    fn vetoed(rule: &'static str) -> Self {
        Self {
            rule: Some(rule),
            vetoed: true,
            ..Self::none()
        }
    }
}

/// What the classifier needs besides the sentence itself.
#[derive(Clone, Copy)]
pub struct ClassifierContext<'a> {
    pub registry: &'a CharacterRegistry,
    pub tagger: &'a dyn PosTagger,
}

/// Find the first rule in table order that matches `sentence`.
pub fn first_matching_rule(sentence: &str) -> Option<&'static MovementRule> {
    RULES.iter().find(|rule| rule.matches(sentence))
}

/// Classify one sentence. Input is lowercased and trimmed here.
pub fn classify(sentence: &str, ctx: &ClassifierContext<'_>) -> Classification {
    let sentence = sentence.trim().to_lowercase();
    if sentence.is_empty() {
        return Classification::none();
    }

    if let Some(rule) = first_matching_rule(&sentence) {
        if rule.is_vetoed(&sentence) {
            return Classification::vetoed(rule.id);
        }
        return Classification {
            kind: rule.kind,
            rule: Some(rule.id),
            vetoed: false,
            mentions: resolve(&sentence, ctx.registry),
        };
    }

    if ctx.tagger.has_verb(&sentence) {
        return Classification::none();
    }
    let mentions = resolve(&sentence, ctx.registry);
    if mentions.is_empty() {
        return Classification::none();
    }
    if has_manner_veto(&sentence) {
        return Classification::vetoed(VERBLESS_RULE);
    }
    Classification {
        kind: MovementKind::Entrance,
        rule: Some(VERBLESS_RULE),
        vetoed: false,
        mentions,
    }
}

/// Manner/address words, except "zu"/"zum"/"zur" directly before
/// "pferd(e)".
fn has_manner_veto(sentence: &str) -> bool {
    if MANNER_VETO.is_match(sentence) {
        return true;
    }
    ADDRESS_ZU
        .find_iter(sentence)
        .any(|m| !ON_HORSEBACK.is_match(&sentence[m.end()..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::tagger::LexiconTagger;
    use crate::schema::character::CharacterId;

    /// Tagger stub: a sentence has a verb iff it contains one of the
    /// listed words.
    struct StubTagger(&'static [&'static str]);

    impl PosTagger for StubTagger {
        fn first_token_is_function_word(&self, _text: &str) -> bool {
            false
        }

        fn has_verb(&self, sentence: &str) -> bool {
            sentence.split_whitespace().any(|w| self.0.contains(&w))
        }
    }

    const VERBS: StubTagger = StubTagger(&["spricht", "sieht", "sitzt"]);

    fn registry() -> CharacterRegistry {
        let mut registry = CharacterRegistry::new();
        registry.register("karl".into(), CharacterId::new("karl1"));
        registry.register("anna".into(), CharacterId::new("anna1"));
        registry.register("franz".into(), CharacterId::new("franz1"));
        registry
    }

    fn run(sentence: &str) -> Classification {
        let registry = registry();
        let ctx = ClassifierContext {
            registry: &registry,
            tagger: &VERBS,
        };
        classify(sentence, &ctx)
    }

    fn kind(sentence: &str) -> MovementKind {
        run(sentence).kind
    }

    fn run_with_lexicon(sentence: &str) -> Classification {
        let mut registry = registry();
        registry.register("prinz".into(), CharacterId::new("prinz"));
        let tagger = LexiconTagger::german();
        let ctx = ClassifierContext {
            registry: &registry,
            tagger: &tagger,
        };
        classify(sentence, &ctx)
    }

    #[test]
    fn tritt_auf_is_entrance() {
        let c = run("Karl tritt auf.");
        assert_eq!(c.kind, MovementKind::Entrance);
        assert_eq!(c.rule, Some("tritt-auf"));
        assert_eq!(c.mentions.to_who(), "#karl1");
    }

    #[test]
    fn gehen_ab_is_exit_with_both_names() {
        let c = run("Karl und Anna gehen ab.");
        assert_eq!(c.kind, MovementKind::Exit);
        assert_eq!(c.mentions.to_who(), "#karl1 #anna1");
    }

    #[test]
    fn intent_vetoes_entrance() {
        let c = run("sie will auf die bühne treten");
        assert_eq!(c.kind, MovementKind::None);
        assert!(c.vetoed);
        assert_eq!(c.rule, Some("tritt-auf"));
    }

    #[test]
    fn intent_vetoes_exit() {
        assert_eq!(kind("franz will fort"), MovementKind::None);
    }

    #[test]
    fn entrance_rules_take_precedence_over_exit_rules() {
        // "kommt" and "hinaus" both present
        assert_eq!(kind("anna kommt von hinaus"), MovementKind::Entrance);
    }

    #[test]
    fn entrance_vocabulary() {
        for sentence in [
            "franz tritt herein",
            "karl kömmt",
            "anna, eintretend",
            "der prinz betritt das zimmer",
            "reiter nahen",
            "karl stürzt herein",
            "aus der tür tritt anna",
            "von bedienten geführt",
        ] {
            assert_eq!(kind(sentence), MovementKind::Entrance, "{sentence}");
        }
    }

    #[test]
    fn exit_vocabulary() {
        for sentence in [
            "karl geht ab",
            "karl und anna abgehn",
            "sie eilen fort",
            "franz entfernt sich langsam",
            "er führt sie ab",
            "anna flieht",
            "karl rennt davon",
            "beide gehen",
            "franz nacheilend",
            "ab",
            "sie eilen ab",
        ] {
            assert_eq!(kind(sentence), MovementKind::Exit, "{sentence}");
        }
    }

    #[test]
    fn exit_rules_by_id() {
        for (sentence, id) in [
            ("karl stürzt in das zimmer", "stürzt-in"),
            ("sie eilen ab in den garten", "eilt-ab"),
            ("sie eilen ab", "ab"),
        ] {
            let c = run(sentence);
            assert_eq!(c.kind, MovementKind::Exit, "{sentence}");
            assert_eq!(c.rule, Some(id), "{sentence}");
        }
    }

    #[test]
    fn auf_und_ab_is_not_an_exit() {
        assert_eq!(kind("sie wandeln auf und ab"), MovementKind::None);
    }

    #[test]
    fn alone_is_left_for_the_driver() {
        assert_eq!(kind("Allein."), MovementKind::Alone);
        assert_eq!(kind("allein"), MovementKind::Alone);
        assert_ne!(kind("karl allein"), MovementKind::Alone);
    }

    #[test]
    fn verbless_name_list_is_entrance() {
        let c = run("Karl, Anna");
        assert_eq!(c.kind, MovementKind::Entrance);
        assert_eq!(c.rule, Some(VERBLESS_RULE));
        assert_eq!(c.mentions.to_who(), "#karl1 #anna1");
    }

    #[test]
    fn verbless_without_names_is_none() {
        assert_eq!(kind("ein zimmer im schloss"), MovementKind::None);
    }

    #[test]
    fn verb_blocks_name_list_heuristic() {
        assert_eq!(kind("karl sitzt am tisch"), MovementKind::None);
    }

    #[test]
    fn manner_words_veto_name_lists() {
        let c = run("leise zu anna");
        assert_eq!(c.kind, MovementKind::None);
        assert!(c.vetoed);
        assert_eq!(kind("zu karl"), MovementKind::None);
        assert_eq!(kind("karl gegen franz"), MovementKind::None);
    }

    #[test]
    fn copula_line_with_a_name_is_entrance() {
        let c = run_with_lexicon("Karl ist im Zimmer.");
        assert_eq!(c.kind, MovementKind::Entrance);
        assert_eq!(c.rule, Some(VERBLESS_RULE));
        assert_eq!(c.mentions.to_who(), "#karl1");
    }

    #[test]
    fn retinue_is_not_a_verb() {
        let c = run_with_lexicon("Der Prinz mit Gefolge.");
        assert_eq!(c.kind, MovementKind::Entrance);
        assert_eq!(c.mentions.to_who(), "#prinz");
    }

    #[test]
    fn on_horseback_is_not_address() {
        assert_eq!(kind("karl zu pferde"), MovementKind::Entrance);
    }

    #[test]
    fn empty_sentence_is_none() {
        assert_eq!(run("   ").kind, MovementKind::None);
        assert_eq!(run("   ").rule, None);
    }
}
