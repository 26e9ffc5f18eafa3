//! End-to-end session: ingest, fit, window, train, generate, export.

use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::corpus::{ingest, EventParser};
use crate::error::{NoteGenError, Result};
use crate::export::{timestamped_prefix, Exporter};
use crate::io::validate_folder;
use crate::model::generator::Generator;
use crate::model::predictor::{EpochSummary, Predictor, TransitionPredictor};
use crate::model::progress::{ProgressReporter, ProgressSink};
use crate::model::seed::StartSeed;
use crate::model::training::train;
use crate::model::vocabulary::{Token, Vocabulary};
use crate::model::window::{build_windows, TrainingWindows};

/// Everything a run builds from one input directory.
///
/// # Responsibilities
/// - Own the vocabulary fitted on the corpus
/// - Own the training windows and the transition predictor
/// - Resolve seeds and run generation against the owned predictor
#[derive(Debug)]
pub struct Session {
	config: PipelineConfig,
	vocabulary: Vocabulary,
	windows: TrainingWindows,
	predictor: TransitionPredictor,
	trained: bool,
}

impl Session {
	/// Ingests `dir`, fits the vocabulary and builds the training windows.
	///
	/// The predictor is created but not trained yet.
	pub fn prepare<P: EventParser>(dir: &Path, parser: &P, config: PipelineConfig) -> Result<Self> {
		config.validate()?;

		let corpus = ingest(dir, parser, config.extension.as_deref(), config.on_parse_error)?;
		let vocabulary = Vocabulary::fit(&corpus.tokens, config.vocabulary_order)?;
		info!("Vocabulary holds {} distinct events", vocabulary.len());

		let windows = build_windows(&corpus.tokens, &vocabulary, config.sequence_length)?;
		info!("Built {} training windows of length {}", windows.len(), windows.sequence_length());

		let predictor = TransitionPredictor::new(config.sequence_length, vocabulary.len(), config.max_order)?;

		Ok(Self {
			config,
			vocabulary,
			windows,
			predictor,
			trained: false,
		})
	}

	/// Rebuilds a session around a previously saved vocabulary and predictor.
	///
	/// `dir` is still ingested to provide seed windows; its tokens must all
	/// belong to the saved vocabulary.
	pub fn restore<P: EventParser>(
		dir: &Path,
		parser: &P,
		config: PipelineConfig,
		artifacts: &Path,
	) -> Result<Self> {
		config.validate()?;

		let vocabulary = Vocabulary::load(artifacts.join(VOCABULARY_FILE))?;
		let predictor = TransitionPredictor::load(artifacts.join(PREDICTOR_FILE))?;
		if predictor.input_len() != config.sequence_length || predictor.vocab_size() != vocabulary.len() {
			return Err(NoteGenError::InvalidConfig(format!(
				"saved predictor expects windows of {} over {} classes, configuration asks for {} over {}",
				predictor.input_len(),
				predictor.vocab_size(),
				config.sequence_length,
				vocabulary.len()
			)));
		}
		let corpus = ingest(dir, parser, config.extension.as_deref(), config.on_parse_error)?;
		let windows = build_windows(&corpus.tokens, &vocabulary, config.sequence_length)?;

		let trained = predictor.is_trained();
		Ok(Self {
			config,
			vocabulary,
			windows,
			predictor,
			trained,
		})
	}

	pub fn config(&self) -> &PipelineConfig {
		&self.config
	}

	pub fn vocabulary(&self) -> &Vocabulary {
		&self.vocabulary
	}

	pub fn windows(&self) -> &TrainingWindows {
		&self.windows
	}

	pub fn predictor(&self) -> &TransitionPredictor {
		&self.predictor
	}

	pub fn is_trained(&self) -> bool {
		self.trained
	}

	/// Trains the predictor for `config.epochs` epochs.
	pub fn train<S: ProgressSink>(&mut self, reporter: &mut ProgressReporter<S>) -> Result<Vec<EpochSummary>> {
		let summaries = train(&mut self.predictor, &self.windows, self.config.epochs, reporter)?;
		self.trained = true;
		Ok(summaries)
	}

	/// Resolves a seed strategy into a window of indices.
	pub fn seed_window(&self, seed: &StartSeed) -> Result<Vec<usize>> {
		let window = seed.resolve(&self.windows, &self.vocabulary)?;
		debug!("Seed window: {:?}", window);
		Ok(window)
	}

	/// Generates `count` notes following `seed`.
	pub fn generate(&self, seed: &StartSeed, count: usize) -> Result<Vec<Token>> {
		let window = self.seed_window(seed)?;
		info!("Predicting {} notes...", count);
		Generator::new(&self.predictor, &self.vocabulary).generate(&window, count)
	}

	/// Writes the generated notes under `output_dir` with a timestamped name.
	pub fn export<E: Exporter>(&self, exporter: &E, notes: &[Token], output_dir: &Path) -> Result<PathBuf> {
		let output_dir = validate_folder(output_dir)?;
		exporter.export(notes, &timestamped_prefix(output_dir))
	}

	/// Saves the vocabulary and predictor under `dir`.
	pub fn save_artifacts(&self, dir: &Path) -> Result<()> {
		let dir = validate_folder(dir)?;
		self.vocabulary.save(dir.join(VOCABULARY_FILE))?;
		self.predictor.save(dir.join(PREDICTOR_FILE))?;
		info!("Saved vocabulary and predictor to {:?}", dir);
		Ok(())
	}
}

/// File name of the saved vocabulary inside an artifact folder.
pub const VOCABULARY_FILE: &str = "vocabulary.bin";

/// File name of the saved predictor inside an artifact folder.
pub const PREDICTOR_FILE: &str = "predictor.bin";
