/// Annotate Dramas — batch entrance/exit annotation of TEI plays.
///
/// Usage: annotate_dramas [config.ron] [--input <dir>] [--output <dir>] [--workers <n>]
use clap::Parser;
use stage_annotator::batch::{
    annotator_for, run_batch, AnnotatorConfig, BatchError, BatchReport, DEFAULT_CONFIG_PATH,
};
use std::path::PathBuf;
use std::process;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "annotate_dramas",
    version,
    about = "Infer entrances and exits in TEI-XML dramas"
)]
struct Cli {
    /// RON config file; defaults are used if it does not exist
    config: Option<PathBuf>,
    /// Override the input directory
    #[arg(long)]
    input: Option<PathBuf>,
    /// Override the output directory
    #[arg(long)]
    output: Option<PathBuf>,
    /// Override the number of worker threads
    #[arg(long)]
    workers: Option<usize>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let report = match run(Cli::parse()) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    println!("\n=== Annotation Report ===\n");
    for doc in &report.processed {
        println!(
            "successfully completed: {} ({} entrances, {} exits, {} of {} stage directions unclassified)",
            doc.path.display(),
            doc.summary.entrances,
            doc.summary.exits,
            doc.summary.unclassified,
            doc.summary.stage_directions,
        );
    }
    for skipped in &report.skipped {
        println!("SKIPPED: {} ({})", skipped.path.display(), skipped.reason);
    }
    println!(
        "\nSummary: {} annotated, {} skipped, {} entrances, {} exits",
        report.processed.len(),
        report.skipped.len(),
        report.total.entrances,
        report.total.exits
    );
}

fn run(cli: Cli) -> Result<BatchReport, BatchError> {
    let config_path = cli
        .config
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH));
    let mut config = if config_path.exists() {
        AnnotatorConfig::load_from_ron(&config_path)?
    } else {
        AnnotatorConfig::default()
    };
    if let Some(input) = cli.input {
        config.input_dir = input;
    }
    if let Some(output) = cli.output {
        config.output_dir = output;
    }
    if cli.workers.is_some() {
        config.workers = cli.workers;
    }

    let annotator = annotator_for(&config)?;
    run_batch(&annotator, &config)
}
