/// Classify Preview — interactive shell for trying stage directions
/// against the rule table.
///
/// Usage: classify_preview [--play <file.xml>] [--lexicon <file.ron>]
///
/// Commands:
///   <text>             — classify every sentence of a stage direction
///   speaker <#id ...>  — set the speaker used as fallback
///   heading            — treat the next line as following an "Auftritt" heading
///   stage              — show who is on stage
///   reset              — start a new scene
///   names              — list the registry's name variants
///   help               — list commands
///   quit               — exit
use clap::Parser;
use stage_annotator::core::classifier::{classify, ClassifierContext};
use stage_annotator::core::driver::{split_sentences, AnnotationDriver, StageDirection};
use stage_annotator::core::pipeline::StageAnnotator;
use stage_annotator::core::registry::CharacterRegistry;
use stage_annotator::schema::mention::MentionSet;
use stage_annotator::tei::TeiDocument;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "classify_preview", about = "Try stage directions against the rules")]
struct Cli {
    /// TEI play whose person list provides the character names
    #[arg(long)]
    play: Option<PathBuf>,
    /// Extra tagger lexicon (RON)
    #[arg(long)]
    lexicon: Option<PathBuf>,
}

fn main() {
    let cli = Cli::parse();

    let mut builder = StageAnnotator::builder();
    if let Some(path) = cli.lexicon {
        builder = builder.lexicon(path);
    }
    let annotator = match builder.build() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            std::process::exit(1);
        }
    };

    let registry = match cli.play {
        Some(path) => match TeiDocument::load(&path)
            .map_err(|e| e.to_string())
            .and_then(|doc| annotator.registry_for(&doc).map_err(|e| e.to_string()))
        {
            Ok(registry) => registry,
            Err(e) => {
                eprintln!("ERROR: cannot read play '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => CharacterRegistry::new(),
    };

    println!("Loaded {} name variants", registry.len());
    println!("Type 'help' for commands.\n");

    let ctx = ClassifierContext {
        registry: &registry,
        tagger: annotator.tagger(),
    };
    let mut driver = AnnotationDriver::new(ctx);
    let mut speaker = MentionSet::new();
    let mut after_heading = false;

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("stage> ");
        stdout.flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line).is_err() || line.is_empty() {
            break;
        }
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let (cmd, rest) = line.split_once(' ').unwrap_or((line, ""));
        match cmd {
            "quit" | "exit" | "q" => break,
            "help" => print_help(),
            "speaker" => {
                speaker = MentionSet::from_who(rest);
                println!("Speaker: {}", speaker);
            }
            "heading" => {
                after_heading = true;
                println!("Next line follows an 'Auftritt' heading.");
            }
            "stage" => println!("On stage: {}", driver.state().stage),
            "reset" => {
                driver.begin_division();
                println!("New scene.");
            }
            "names" => {
                for (name, id) in registry.names() {
                    println!("  {:<30} {}", name, id.reference());
                }
            }
            _ => {
                let lowered = line.to_lowercase();
                for sentence in split_sentences(&lowered) {
                    let c = classify(sentence, &ctx);
                    println!(
                        "  {:<40} {:?}{} [{}] {}",
                        sentence,
                        c.kind,
                        if c.vetoed { " (vetoed)" } else { "" },
                        c.rule.unwrap_or("-"),
                        c.mentions
                    );
                }
                let mut stage = StageDirection::new(line).spoken_by(speaker.clone());
                if after_heading {
                    stage = stage.after_heading();
                    after_heading = false;
                }
                match driver.annotate(&stage) {
                    Some(a) => println!("=> type=\"{}\" who=\"{}\"", a.movement.as_str(), a.who),
                    None => println!("=> no annotation"),
                }
                println!("   on stage: {}", driver.state().stage);
            }
        }
    }
}

fn print_help() {
    println!("  <text>             classify a stage direction and update the stage");
    println!("  speaker <#id ...>  set the fallback speaker");
    println!("  heading            next line follows an 'Auftritt' heading");
    println!("  stage              show who is on stage");
    println!("  reset              start a new scene");
    println!("  names              list name variants");
    println!("  quit               exit");
}
