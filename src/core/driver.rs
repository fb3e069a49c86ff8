/// Annotation driver — walks the stage directions of one division in
/// order and turns classifier output into `type`/`who` decisions.
///
/// All state that crosses stage directions lives in [`DivisionState`]
/// and is reset at every division boundary.

use tracing::{debug, trace};

use crate::core::classifier::{classify, ClassifierContext};
use crate::core::mentions::resolve;
use crate::core::stage::StageSet;
use crate::schema::mention::MentionSet;
use crate::schema::movement::{Movement, MovementKind};

/// Marker for "die Vorigen": the characters already present.
const CARRY_OVER_MARKER: &str = "vorige";

/// One stage direction as the driver sees it, detached from the XML.
#[derive(Debug, Clone, Default)]
pub struct StageDirection {
    pub text: String,
    /// The element directly follows a heading containing "Auftritt".
    pub after_scene_heading: bool,
    /// IDs from the nearest enclosing speech's `who`.
    pub speaker: MentionSet,
    /// The element's `who` before annotation, if it had one.
    pub who: Option<MentionSet>,
}

impl StageDirection {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn after_heading(mut self) -> Self {
        self.after_scene_heading = true;
        self
    }

    pub fn spoken_by(mut self, speaker: MentionSet) -> Self {
        self.speaker = speaker;
        self
    }

    pub fn with_who(mut self, who: MentionSet) -> Self {
        self.who = Some(who);
        self
    }
}

/// The attributes to write onto a stage direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
    pub movement: Movement,
    pub who: MentionSet,
}

/// Working state for one scene or act.
#[derive(Debug, Clone, Default)]
pub struct DivisionState {
    pub stage: StageSet,
    /// Characters a later "die Vorigen" refers back to.
    pub previous: MentionSet,
}

pub struct AnnotationDriver<'a> {
    ctx: ClassifierContext<'a>,
    state: DivisionState,
}

impl<'a> AnnotationDriver<'a> {
    pub fn new(ctx: ClassifierContext<'a>) -> Self {
        Self {
            ctx,
            state: DivisionState::default(),
        }
    }

    pub fn state(&self) -> &DivisionState {
        &self.state
    }

    /// Start a new scene or act: nobody is on stage.
    pub fn begin_division(&mut self) {
        self.state = DivisionState::default();
    }

    /// Annotate a whole division from a fresh state.
    pub fn annotate_division(&mut self, stages: &[StageDirection]) -> Vec<Option<Annotation>> {
        self.begin_division();
        stages.iter().map(|stage| self.annotate(stage)).collect()
    }

    /// Annotate one stage direction, updating the division state.
    /// Returns the attributes as they stand after the last sentence.
    pub fn annotate(&mut self, stage: &StageDirection) -> Option<Annotation> {
        let text = stage
            .text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();

        if stage.after_scene_heading {
            return Some(self.annotate_scene_opening(&text));
        }

        let mut current: Option<Annotation> = None;
        let mut who = stage.who.clone();

        for sentence in split_sentences(&text) {
            let classification = classify(sentence, &self.ctx);
            debug!(
                sentence,
                rule = classification.rule,
                vetoed = classification.vetoed,
                kind = ?classification.kind,
                mentions = %classification.mentions,
                "classified stage sentence"
            );

            let annotation = match classification.kind {
                MovementKind::Entrance => {
                    let mut persons = or_speaker(classification.mentions, stage);
                    if let Some(existing) = &who {
                        persons.merge(existing);
                    }
                    self.state.stage.add(&persons);
                    Annotation {
                        movement: Movement::Entrance,
                        who: persons,
                    }
                }
                MovementKind::Exit => {
                    let mut persons = or_speaker(classification.mentions, stage);
                    if let Some(existing) = &who {
                        persons.merge(existing);
                    }
                    self.state.stage.remove(&persons);
                    self.state.previous.remove_all(&persons);
                    Annotation {
                        movement: Movement::Exit,
                        who: persons,
                    }
                }
                MovementKind::Alone => {
                    let persons = or_speaker(classification.mentions, stage);
                    let movement = if self.state.stage.contains_all(&persons) {
                        Movement::Exit
                    } else {
                        Movement::Entrance
                    };
                    // Removed on both branches; see DESIGN.md.
                    self.state.stage.remove(&persons);
                    Annotation {
                        movement,
                        who: persons,
                    }
                }
                MovementKind::None => continue,
            };

            trace!(stage = %self.state.stage, "stage set updated");
            who = Some(annotation.who.clone());
            current = Some(annotation);
        }

        current
    }

    /// A stage direction right after an "Auftritt" heading lists who is
    /// on stage when the scene opens.
    fn annotate_scene_opening(&mut self, text: &str) -> Annotation {
        let mut persons = resolve(text, self.ctx.registry);
        if text.contains(CARRY_OVER_MARKER) && !self.state.previous.is_empty() {
            persons.merge(&self.state.previous);
        }
        self.state.previous = persons.clone();
        self.state.stage.replace(persons.clone());
        debug!(who = %persons, "scene opening");
        Annotation {
            movement: Movement::Entrance,
            who: persons,
        }
    }
}

/// Split on `.` and `;`, dropping empty pieces.
pub fn split_sentences(text: &str) -> impl Iterator<Item = &str> {
    text.split(['.', ';'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn or_speaker(mentions: MentionSet, stage: &StageDirection) -> MentionSet {
    if mentions.is_empty() {
        stage.speaker.clone()
    } else {
        mentions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::registry::CharacterRegistry;
    use crate::core::tagger::LexiconTagger;
    use crate::schema::character::CharacterId;

    fn registry() -> CharacterRegistry {
        let mut registry = CharacterRegistry::new();
        registry.register("karl".into(), CharacterId::new("karl1"));
        registry.register("anna".into(), CharacterId::new("anna1"));
        registry.register("franz".into(), CharacterId::new("franz1"));
        registry
    }

    fn who(s: &str) -> MentionSet {
        MentionSet::from_who(s)
    }

    fn with_driver<R>(f: impl FnOnce(&mut AnnotationDriver<'_>) -> R) -> R {
        let registry = registry();
        let tagger = LexiconTagger::german();
        let mut driver = AnnotationDriver::new(ClassifierContext {
            registry: &registry,
            tagger: &tagger,
        });
        f(&mut driver)
    }

    #[test]
    fn entrance_adds_to_stage() {
        with_driver(|driver| {
            let a = driver.annotate(&StageDirection::new("Karl tritt auf.")).unwrap();
            assert_eq!(a.movement, Movement::Entrance);
            assert_eq!(a.who.to_who(), "#karl1");
            assert_eq!(driver.state().stage.members().to_who(), "#karl1");
        });
    }

    #[test]
    fn exit_removes_everyone_named() {
        with_driver(|driver| {
            driver.annotate(&StageDirection::new("Karl, Anna und Franz treten auf."));
            let a = driver
                .annotate(&StageDirection::new("Karl und Anna gehen ab."))
                .unwrap();
            assert_eq!(a.movement, Movement::Exit);
            assert_eq!(a.who.to_who(), "#karl1 #anna1");
            assert_eq!(driver.state().stage.members().to_who(), "#franz1");
        });
    }

    #[test]
    fn speaker_fills_in_for_unnamed_movement() {
        with_driver(|driver| {
            let stage = StageDirection::new("geht ab").spoken_by(who("#franz1"));
            let a = driver.annotate(&stage).unwrap();
            assert_eq!(a.movement, Movement::Exit);
            assert_eq!(a.who.to_who(), "#franz1");
        });
    }

    #[test]
    fn existing_who_is_appended() {
        with_driver(|driver| {
            let stage = StageDirection::new("Anna kommt.").with_who(who("#karl1 #anna1"));
            let a = driver.annotate(&stage).unwrap();
            assert_eq!(a.who.to_who(), "#anna1 #karl1");
        });
    }

    #[test]
    fn scene_heading_forces_entrance() {
        with_driver(|driver| {
            let a = driver
                .annotate(&StageDirection::new("Karl, Anna.").after_heading())
                .unwrap();
            assert_eq!(a.movement, Movement::Entrance);
            assert_eq!(a.who.to_who(), "#karl1 #anna1");
            assert_eq!(driver.state().previous.to_who(), "#karl1 #anna1");
        });
    }

    #[test]
    fn die_vorigen_carries_previous_persons() {
        with_driver(|driver| {
            driver.annotate(&StageDirection::new("Karl, Anna.").after_heading());
            let a = driver
                .annotate(&StageDirection::new("Die Vorigen. Franz.").after_heading())
                .unwrap();
            assert_eq!(a.who.to_who(), "#franz1 #karl1 #anna1");
            assert_eq!(driver.state().stage.len(), 3);
        });
    }

    #[test]
    fn exit_drops_from_carry_over() {
        with_driver(|driver| {
            driver.annotate(&StageDirection::new("Karl, Anna.").after_heading());
            driver.annotate(&StageDirection::new("Anna geht ab."));
            let a = driver
                .annotate(&StageDirection::new("Die Vorigen.").after_heading())
                .unwrap();
            assert_eq!(a.who.to_who(), "#karl1");
        });
    }

    #[test]
    fn alone_with_speaker_on_stage_is_exit() {
        with_driver(|driver| {
            driver.annotate(&StageDirection::new("Karl tritt auf."));
            let a = driver
                .annotate(&StageDirection::new("Allein.").spoken_by(who("#karl1")))
                .unwrap();
            assert_eq!(a.movement, Movement::Exit);
            assert_eq!(a.who.to_who(), "#karl1");
            assert!(driver.state().stage.is_empty());
        });
    }

    #[test]
    fn alone_with_empty_stage_is_entrance_and_still_removes() {
        with_driver(|driver| {
            let a = driver
                .annotate(&StageDirection::new("Allein.").spoken_by(who("#karl1")))
                .unwrap();
            assert_eq!(a.movement, Movement::Entrance);
            assert_eq!(a.who.to_who(), "#karl1");
            assert!(driver.state().stage.is_empty());
        });
    }

    #[test]
    fn last_classified_sentence_wins() {
        with_driver(|driver| {
            let a = driver
                .annotate(&StageDirection::new("Karl tritt auf; Anna geht ab."))
                .unwrap();
            assert_eq!(a.movement, Movement::Exit);
            // the entrance's who was already on the node and is merged in
            assert_eq!(a.who.to_who(), "#anna1 #karl1");
        });
    }

    #[test]
    fn unclassified_text_writes_nothing() {
        with_driver(|driver| {
            assert_eq!(driver.annotate(&StageDirection::new("Es wird Nacht.")), None);
            assert_eq!(driver.annotate(&StageDirection::new("")), None);
        });
    }

    #[test]
    fn vetoed_sentence_writes_nothing() {
        with_driver(|driver| {
            let stage = StageDirection::new("Karl will auf die Bühne treten.");
            assert_eq!(driver.annotate(&stage), None);
            assert!(driver.state().stage.is_empty());
        });
    }

    #[test]
    fn division_boundary_resets_state() {
        with_driver(|driver| {
            let first = vec![StageDirection::new("Karl tritt auf.")];
            driver.annotate_division(&first);
            assert!(driver.state().stage.contains(&CharacterId::new("karl1")));

            let second = vec![StageDirection::new("Allein.").spoken_by(who("#karl1"))];
            let results = driver.annotate_division(&second);
            assert_eq!(results[0].as_ref().unwrap().movement, Movement::Entrance);
        });
    }

    #[test]
    fn split_sentences_drops_empty_pieces() {
        let parts: Vec<&str> = split_sentences("karl tritt auf. ; anna kommt.").collect();
        assert_eq!(parts, vec!["karl tritt auf", "anna kommt"]);
    }
}
