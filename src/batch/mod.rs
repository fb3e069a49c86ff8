pub mod config;
pub mod runner;

pub use config::{AnnotatorConfig, ConfigError, DEFAULT_CONFIG_PATH};
pub use runner::{annotator_for, run_batch, BatchError, BatchReport};
