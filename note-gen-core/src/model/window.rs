use log::debug;

use super::normalizer::normalize_window;
use super::vocabulary::{Token, Vocabulary};
use crate::error::{NoteGenError, Result};

/// Training data carved out of a corpus.
///
/// All four sequences are parallel: entry `k` describes the window starting
/// at corpus position `k`.
///
/// # Invariants
/// - `len() == corpus_len - sequence_length`
/// - every window has exactly `sequence_length` entries
/// - `targets[k]` is one-hot at `target_indices[k]` over `vocab_size` classes
#[derive(Clone, Debug, PartialEq)]
pub struct TrainingWindows {
	sequence_length: usize,
	vocab_size: usize,
	/// Raw index windows, kept for decoding and seed selection.
	windows: Vec<Vec<usize>>,
	/// Normalized windows fed to the predictor.
	inputs: Vec<Vec<f32>>,
	target_indices: Vec<usize>,
	/// One-hot encodings of `target_indices`.
	targets: Vec<Vec<f32>>,
}

impl TrainingWindows {
	pub fn len(&self) -> usize {
		self.windows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.windows.is_empty()
	}

	pub fn sequence_length(&self) -> usize {
		self.sequence_length
	}

	pub fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	pub fn windows(&self) -> &[Vec<usize>] {
		&self.windows
	}

	pub fn inputs(&self) -> &[Vec<f32>] {
		&self.inputs
	}

	pub fn targets(&self) -> &[Vec<f32>] {
		&self.targets
	}

	pub fn target_indices(&self) -> &[usize] {
		&self.target_indices
	}

	/// Iterates over `(raw window, target index)` pairs.
	pub fn pairs(&self) -> impl Iterator<Item = (&[usize], usize)> {
		self.windows.iter().map(Vec::as_slice).zip(self.target_indices.iter().copied())
	}
}

/// One-hot vector of `size` classes with a `1.0` at `index`.
pub fn one_hot(index: usize, size: usize) -> Vec<f32> {
	let mut encoded = vec![0.0; size];
	encoded[index] = 1.0;
	encoded
}

/// Slices `corpus` into every window of length `sequence_length` (stride 1)
/// paired with the token that follows it.
///
/// # Errors
/// - `InvalidConfig` if `sequence_length` is zero
/// - `WindowTooLong` if `sequence_length >= corpus.len()`
/// - `UnknownToken` if the corpus holds a token the vocabulary was not fitted on
pub fn build_windows<S: AsRef<str>>(
	corpus: &[S],
	vocabulary: &Vocabulary,
	sequence_length: usize,
) -> Result<TrainingWindows> {
	if sequence_length == 0 {
		return Err(NoteGenError::InvalidConfig("sequence length must be greater than zero".to_owned()));
	}
	if sequence_length >= corpus.len() {
		return Err(NoteGenError::WindowTooLong {
			length: sequence_length,
			corpus_len: corpus.len(),
		});
	}

	let encoded = vocabulary.encode_many(corpus)?;
	let vocab_size = vocabulary.len();
	let count = encoded.len() - sequence_length;

	let mut windows = Vec::with_capacity(count);
	let mut inputs = Vec::with_capacity(count);
	let mut target_indices = Vec::with_capacity(count);
	let mut targets = Vec::with_capacity(count);

	for start in 0..count {
		let window = encoded[start..start + sequence_length].to_vec();
		let target = encoded[start + sequence_length];

		inputs.push(normalize_window(&window, vocab_size));
		windows.push(window);
		targets.push(one_hot(target, vocab_size));
		target_indices.push(target);
	}

	debug!("Built {} windows of length {} over {} classes", count, sequence_length, vocab_size);

	Ok(TrainingWindows {
		sequence_length,
		vocab_size,
		windows,
		inputs,
		target_indices,
		targets,
	})
}

/// Decodes a raw window back to tokens, mostly for diagnostics.
pub fn decode_window(window: &[usize], vocabulary: &Vocabulary) -> Result<Vec<Token>> {
	vocabulary.decode_many(window)
}
