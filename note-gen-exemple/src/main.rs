use std::path::Path;

use log::info;
use note_gen_core::config::{ParseErrorPolicy, PipelineConfig};
use note_gen_core::corpus::JsonlParser;
use note_gen_core::export::TextExporter;
use note_gen_core::model::progress::{JsonFileSink, LogSink, ProgressReporter};
use note_gen_core::model::seed::StartSeed;
use note_gen_core::model::vocabulary::VocabularyOrder;
use note_gen_core::pipeline::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // RUST_LOG=debug for per-file and per-window details
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Load the configuration if one is present, defaults otherwise
    let config_path = Path::new("./config.json");
    let mut config = if config_path.exists() {
        PipelineConfig::load(config_path)?
    } else {
        PipelineConfig::default()
    };

    // Number of notes used to predict the next one
    config.sequence_length = 16;

    // Abort on the first unreadable file ('Skip' logs it and moves on)
    config.on_parse_error = ParseErrorPolicy::Fail;

    // Indices follow first occurrence in the corpus
    config.vocabulary_order = VocabularyOrder::Encounter;

    // Read every .jsonl file of the data folder, in file name order
    let mut session = Session::prepare(Path::new("./data/midi-json"), &JsonlParser, config)?;
    info!(
        "{} distinct events, {} training windows",
        session.vocabulary().len(),
        session.windows().len()
    );

    // Progress is written to a JSON file an external monitor can poll, and logged
    let output = note_gen_core::io::validate_folder("./output")?;
    let mut reporter = ProgressReporter::new((JsonFileSink::new(output.join("state.json")), LogSink));
    session.train(&mut reporter)?;
    println!("Training progress kept in {}", reporter.sink().0.path().display());
    session.save_artifacts(&output.join("weights"))?;

    // Seed can be
    // 'Random' to start from a random training window
    // 'Window' to start from a given training window
    // 'Custom' to start from explicit events
    let notes = session.generate(&StartSeed::Random, session.config().notes)?;

    // Unknown events are rejected, never replaced
    match session.generate(&StartSeed::Custom(vec!["not an event".to_owned(); 16]), 1) {
        Ok(_) => println!("Should not happen"),
        Err(e) => println!("Custom seed rejected: {}", e),
    }

    let path = session.export(&TextExporter, &notes, &output.join("notes"))?;
    println!("Generated {} notes into {}", notes.len(), path.display());

    Ok(())
}
