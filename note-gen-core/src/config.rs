//! Pipeline configuration.
//!
//! Core components never read these values implicitly: the session passes
//! each one explicitly to the stage that needs it.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NoteGenError, Result};
use crate::model::vocabulary::VocabularyOrder;

/// What ingestion does when an input file fails to parse.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ParseErrorPolicy {
	/// Abort the whole ingestion, naming the file.
	Fail,
	/// Log the file and continue with the next one.
	Skip,
}

/// Settings for one training and generation run.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PipelineConfig {
	/// Window length `L` used for training and generation.
	pub sequence_length: usize,
	pub on_parse_error: ParseErrorPolicy,
	pub vocabulary_order: VocabularyOrder,
	/// Training epochs.
	pub epochs: usize,
	/// Number of notes to generate after training.
	pub notes: usize,
	/// Longest context the transition predictor conditions on.
	pub max_order: usize,
	/// Only ingest files with this extension (all files when `None`).
	pub extension: Option<String>,
}

impl Default for PipelineConfig {
	fn default() -> Self {
		Self {
			sequence_length: 32,
			on_parse_error: ParseErrorPolicy::Fail,
			vocabulary_order: VocabularyOrder::Encounter,
			epochs: 5,
			notes: 100,
			max_order: 4,
			extension: Some("jsonl".to_owned()),
		}
	}
}

impl PipelineConfig {
	/// Checks the invariants the pipeline relies on.
	pub fn validate(&self) -> Result<()> {
		if self.sequence_length == 0 {
			return Err(NoteGenError::InvalidConfig("sequence_length must be greater than zero".into()));
		}
		if self.epochs == 0 {
			return Err(NoteGenError::InvalidConfig("epochs must be greater than zero".into()));
		}
		Ok(())
	}

	/// Loads and validates a JSON configuration file.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let path = path.as_ref();
		let json = std::fs::read_to_string(path).map_err(|err| NoteGenError::io(err, Some(path.to_path_buf())))?;
		let config: Self = serde_json::from_str(&json)?;
		config.validate()?;
		Ok(config)
	}

	/// Writes the configuration as pretty JSON.
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let path = path.as_ref();
		let json = serde_json::to_string_pretty(self)?;
		std::fs::write(path, json).map_err(|err| NoteGenError::io(err, Some(path.to_path_buf())))
	}

	/// Applies string overrides supplied by an external caller.
	///
	/// Recognised keys: `epochs`, `notes`, `sequence_length`. Unknown keys
	/// are ignored. The configuration is left untouched if any value fails
	/// to parse or the result does not validate.
	pub fn apply_settings(&mut self, settings: &HashMap<String, String>) -> Result<()> {
		fn parse(settings: &HashMap<String, String>, key: &str) -> Result<Option<usize>> {
			settings
				.get(key)
				.map(|value| {
					value.trim().parse::<usize>().map_err(|_| {
						NoteGenError::InvalidConfig(format!("setting {} must be a non-negative integer, got {:?}", key, value))
					})
				})
				.transpose()
		}

		let mut updated = self.clone();
		if let Some(epochs) = parse(settings, "epochs")? {
			updated.epochs = epochs;
		}
		if let Some(notes) = parse(settings, "notes")? {
			updated.notes = notes;
		}
		if let Some(sequence_length) = parse(settings, "sequence_length")? {
			updated.sequence_length = sequence_length;
		}
		updated.validate()?;

		*self = updated;
		Ok(())
	}
}
