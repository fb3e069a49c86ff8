/// The annotation pipeline: TEI document → annotated TEI document.
///
/// Wires together character registry construction, the per-division
/// driver and writing decisions back onto the document.

use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::classifier::ClassifierContext;
use crate::core::driver::AnnotationDriver;
use crate::core::registry::CharacterRegistry;
use crate::core::tagger::{LexiconError, LexiconTagger, PosTagger};
use crate::schema::movement::Movement;
use crate::tei::{TeiDocument, TeiError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("TEI error: {0}")]
    Tei(#[from] TeiError),
    #[error("lexicon error: {0}")]
    Lexicon(#[from] LexiconError),
}

/// Counts for one annotated document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnnotationSummary {
    pub divisions: usize,
    pub stage_directions: usize,
    pub entrances: usize,
    pub exits: usize,
    pub unclassified: usize,
}

impl AnnotationSummary {
    pub fn absorb(&mut self, other: &AnnotationSummary) {
        self.divisions += other.divisions;
        self.stage_directions += other.stage_directions;
        self.entrances += other.entrances;
        self.exits += other.exits;
        self.unclassified += other.unclassified;
    }
}

/// The top-level annotator. Built via `StageAnnotator::builder()`.
///
/// Holds only read-only data, so one instance can serve many worker
/// threads at once.
pub struct StageAnnotator {
    tagger: Box<dyn PosTagger>,
}

/// Builder for constructing a `StageAnnotator`.
pub struct StageAnnotatorBuilder {
    lexicon_paths: Vec<PathBuf>,
    /// Directly provided tagger (for testing without the lexicon).
    tagger: Option<Box<dyn PosTagger>>,
}

impl StageAnnotator {
    pub fn builder() -> StageAnnotatorBuilder {
        StageAnnotatorBuilder {
            lexicon_paths: Vec::new(),
            tagger: None,
        }
    }

    pub fn tagger(&self) -> &dyn PosTagger {
        self.tagger.as_ref()
    }

    /// Build the character registry for a document.
    pub fn registry_for(&self, doc: &TeiDocument) -> Result<CharacterRegistry, PipelineError> {
        let characters = doc.characters()?;
        Ok(CharacterRegistry::build(&characters, self.tagger()))
    }

    /// Annotate every stage direction of `doc` in place.
    pub fn annotate(&self, doc: &mut TeiDocument) -> Result<AnnotationSummary, PipelineError> {
        let registry = self.registry_for(doc)?;
        debug!(names = registry.len(), "character registry built");

        let mut driver = AnnotationDriver::new(ClassifierContext {
            registry: &registry,
            tagger: self.tagger(),
        });
        let mut summary = AnnotationSummary::default();

        for division in doc.divisions() {
            summary.divisions += 1;
            driver.begin_division();
            for stage in &division.stages {
                summary.stage_directions += 1;
                match driver.annotate(&stage.direction) {
                    Some(annotation) => {
                        match annotation.movement {
                            Movement::Entrance => summary.entrances += 1,
                            Movement::Exit => summary.exits += 1,
                        }
                        doc.annotate(stage.element, annotation);
                    }
                    None => summary.unclassified += 1,
                }
            }
        }

        Ok(summary)
    }

    /// Annotate an XML string and return the serialized result.
    pub fn annotate_xml(&self, xml: &str) -> Result<(String, AnnotationSummary), PipelineError> {
        let mut doc = TeiDocument::parse(xml)?;
        let summary = self.annotate(&mut doc)?;
        Ok((doc.to_xml()?, summary))
    }

    /// Read `input`, annotate it and write the result to `output`.
    pub fn annotate_file(
        &self,
        input: &Path,
        output: &Path,
    ) -> Result<AnnotationSummary, PipelineError> {
        let mut doc = TeiDocument::load(input)?;
        let summary = self.annotate(&mut doc)?;
        doc.save(output)?;
        info!(
            file = %input.display(),
            entrances = summary.entrances,
            exits = summary.exits,
            "annotated"
        );
        Ok(summary)
    }
}

impl StageAnnotatorBuilder {
    /// Merge an extra RON lexicon into the built-in German one.
    pub fn lexicon(mut self, path: impl Into<PathBuf>) -> Self {
        self.lexicon_paths.push(path.into());
        self
    }

    /// Provide a tagger directly, replacing the lexicon tagger.
    pub fn with_tagger(mut self, tagger: impl PosTagger + 'static) -> Self {
        self.tagger = Some(Box::new(tagger));
        self
    }

    pub fn build(self) -> Result<StageAnnotator, PipelineError> {
        let tagger = match self.tagger {
            Some(tagger) => tagger,
            None => {
                let mut lexicon = LexiconTagger::german();
                for path in &self.lexicon_paths {
                    lexicon.merge(LexiconTagger::load_from_ron(path)?);
                }
                Box::new(lexicon) as Box<dyn PosTagger>
            }
        };
        Ok(StageAnnotator { tagger })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCENE: &str = r##"<TEI xmlns="http://www.tei-c.org/ns/1.0">
<listPerson>
  <person xml:id="karl"><persName>Karl</persName></person>
  <person xml:id="anna"><persName>Anna</persName></person>
</listPerson>
<div type="scene">
  <head>Erster Auftritt</head>
  <stage>Karl.</stage>
  <sp who="#karl"><p>Wo bleibt sie?</p></sp>
  <stage>Anna tritt auf.</stage>
  <stage>Es wird Abend.</stage>
  <stage>Beide gehen ab.</stage>
</div>
</TEI>"##;

    #[test]
    fn summary_counts_decisions() {
        let annotator = StageAnnotator::builder().build().unwrap();
        let (_, summary) = annotator.annotate_xml(SCENE).unwrap();
        assert_eq!(
            summary,
            AnnotationSummary {
                divisions: 1,
                stage_directions: 4,
                entrances: 2,
                exits: 1,
                unclassified: 1,
            }
        );
    }

    #[test]
    fn missing_lexicon_file_fails_the_build() {
        let result = StageAnnotator::builder()
            .lexicon("does/not/exist.ron")
            .build();
        assert!(matches!(result, Err(PipelineError::Lexicon(_))));
    }

    #[test]
    fn summaries_add_up() {
        let mut total = AnnotationSummary::default();
        let one = AnnotationSummary {
            divisions: 1,
            stage_directions: 3,
            entrances: 1,
            exits: 1,
            unclassified: 1,
        };
        total.absorb(&one);
        total.absorb(&one);
        assert_eq!(total.stage_directions, 6);
        assert_eq!(total.exits, 2);
    }
}
