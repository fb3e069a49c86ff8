/// Batch runner — annotates every play in the input directory.
///
/// Each document is processed independently on a rayon pool. A document
/// that fails is logged and recorded as skipped; it never stops the
/// batch.

use rayon::prelude::*;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use crate::batch::config::{AnnotatorConfig, ConfigError};
use crate::core::pipeline::{AnnotationSummary, PipelineError, StageAnnotator};

#[derive(Debug, Error)]
pub enum BatchError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
    #[error("annotator setup failed: {0}")]
    Pipeline(#[from] PipelineError),
    #[error("cannot read input directory {path}: {source}")]
    InputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("worker pool error: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    pub path: PathBuf,
    pub summary: AnnotationSummary,
}

#[derive(Debug, Clone)]
pub struct SkippedDocument {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub processed: Vec<ProcessedDocument>,
    pub skipped: Vec<SkippedDocument>,
    pub total: AnnotationSummary,
}

/// Build the annotator a config asks for.
pub fn annotator_for(config: &AnnotatorConfig) -> Result<StageAnnotator, BatchError> {
    let mut builder = StageAnnotator::builder();
    if let Some(lexicon) = &config.lexicon {
        builder = builder.lexicon(lexicon);
    }
    Ok(builder.build()?)
}

/// Annotate every wanted file of `config.input_dir` into
/// `config.output_dir`, keeping file names.
pub fn run_batch(
    annotator: &StageAnnotator,
    config: &AnnotatorConfig,
) -> Result<BatchReport, BatchError> {
    let inputs = collect_inputs(config)?;
    std::fs::create_dir_all(&config.output_dir).map_err(|source| BatchError::OutputDir {
        path: config.output_dir.clone(),
        source,
    })?;

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.workers.unwrap_or(0))
        .build()?;
    info!(
        files = inputs.len(),
        workers = pool.current_num_threads(),
        "starting batch"
    );

    let results: Vec<(PathBuf, Result<AnnotationSummary, PipelineError>)> = pool.install(|| {
        inputs
            .par_iter()
            .map(|input| {
                info!(file = %input.display(), "in progress");
                let output = output_path(&config.output_dir, input);
                (input.clone(), annotator.annotate_file(input, &output))
            })
            .collect()
    });

    let mut report = BatchReport::default();
    for (path, result) in results {
        match result {
            Ok(summary) => {
                report.total.absorb(&summary);
                report.processed.push(ProcessedDocument { path, summary });
            }
            Err(e) => {
                warn!(file = %path.display(), error = %e, "failed to load file, skipping");
                report.skipped.push(SkippedDocument {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }
    Ok(report)
}

/// Regular files of the input directory that pass the allow-list, in
/// name order.
fn collect_inputs(config: &AnnotatorConfig) -> Result<Vec<PathBuf>, BatchError> {
    let read_error = |source| BatchError::InputDir {
        path: config.input_dir.clone(),
        source,
    };
    let mut inputs = Vec::new();
    for entry in std::fs::read_dir(&config.input_dir).map_err(read_error)? {
        let path = entry.map_err(read_error)?.path();
        if path.is_file() && config.wants(&path) {
            inputs.push(path);
        }
    }
    inputs.sort();
    Ok(inputs)
}

fn output_path(output_dir: &Path, input: &Path) -> PathBuf {
    match input.file_name() {
        Some(name) => output_dir.join(name),
        None => output_dir.join("unnamed.xml"),
    }
}
