/// Batch configuration, read from RON.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

pub const DEFAULT_CONFIG_PATH: &str = "annotator.ron";

/// Where to read plays from, where to write them, and which ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnnotatorConfig {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// File stems to process. Empty means every file in `input_dir`.
    pub dramas: Vec<String>,
    /// Extra tagger lexicon merged into the built-in one.
    pub lexicon: Option<PathBuf>,
    /// Worker threads; `None` uses one per core.
    pub workers: Option<usize>,
}

impl Default for AnnotatorConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("unannotated-texts"),
            output_dir: PathBuf::from("automatically-annotated-texts"),
            dramas: Vec::new(),
            lexicon: None,
            workers: None,
        }
    }
}

impl AnnotatorConfig {
    pub fn load_from_ron(path: &Path) -> Result<AnnotatorConfig, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<AnnotatorConfig, ConfigError> {
        Ok(ron::from_str(input)?)
    }

    /// Whether `path` passes the `dramas` allow-list.
    pub fn wants(&self, path: &Path) -> bool {
        if self.dramas.is_empty() {
            return true;
        }
        path.file_stem()
            .and_then(|s| s.to_str())
            .is_some_and(|stem| self.dramas.iter().any(|d| d == stem))
    }
}
