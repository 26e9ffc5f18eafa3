use std::path::PathBuf;

use thiserror::Error;

use crate::model::vocabulary::Token;

/// Result type used throughout the crate.
pub type Result<T, E = NoteGenError> = std::result::Result<T, E>;

/// Every failure the pipeline can surface.
///
/// Each variant carries the offending value (token, index, path, length)
/// so the caller can report what went wrong without extra context.
/// None of these are retried internally.
#[derive(Debug, Error)]
pub enum NoteGenError {
	/// No tokens to work with (empty directory, empty files, empty stream).
	#[error("empty corpus: {0}")]
	EmptyCorpus(String),

	/// An input file could not be parsed into events.
	#[error("failed to parse {path:?}: {reason}")]
	FileParse {
		path: PathBuf,
		reason: String,
	},

	/// Token not present when the vocabulary was fitted.
	#[error("unknown token {0:?}")]
	UnknownToken(Token),

	/// Index outside `[0, size)`.
	#[error("index {index} out of range for vocabulary of size {size}")]
	IndexOutOfRange {
		index: usize,
		size: usize,
	},

	/// The corpus is too short to produce a single window.
	#[error("window length {length} needs a corpus longer than {corpus_len} tokens")]
	WindowTooLong {
		length: usize,
		corpus_len: usize,
	},

	/// Seed window does not match the predictor input length.
	#[error("seed window has length {actual}, predictor expects {expected}")]
	InvalidSeedLength {
		expected: usize,
		actual: usize,
	},

	/// The predictor failed or returned a malformed distribution.
	#[error("predictor contract violated: {0}")]
	PredictorContract(String),

	/// Configuration failed validation.
	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	/// Filesystem error with optional context path.
	#[error("io error while processing {path:?}: {source}")]
	Io {
		source: std::io::Error,
		path: Option<PathBuf>,
	},

	/// Artifact (de)serialization failure.
	#[error("serialization error: {0}")]
	Serialization(String),
}

impl NoteGenError {
	/// Wraps an IO error, attaching the path being processed.
	pub fn io(source: std::io::Error, path: Option<PathBuf>) -> Self {
		Self::Io { source, path }
	}
}

impl From<postcard::Error> for NoteGenError {
	fn from(err: postcard::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}

impl From<serde_json::Error> for NoteGenError {
	fn from(err: serde_json::Error) -> Self {
		Self::Serialization(err.to_string())
	}
}
