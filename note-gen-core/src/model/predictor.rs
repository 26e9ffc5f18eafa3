use std::path::Path;

use serde::{Deserialize, Serialize};

use super::context_model::ContextModel;
use super::window::TrainingWindows;
use crate::error::{NoteGenError, Result};

/// Error type a predictor may return; wrapped into `PredictorContract`.
pub type PredictorError = Box<dyn std::error::Error + Send + Sync>;

/// Scores the next vocabulary index given a normalized window.
///
/// Implementations must behave as a pure function of the window as far as
/// the pipeline can observe, and return exactly one score per vocabulary
/// index, in the vocabulary's index order.
pub trait Predictor {
	/// Window length the predictor expects.
	fn input_len(&self) -> usize;

	/// Scores every vocabulary index for the position following `window`.
	fn predict(&self, window: &[f32]) -> std::result::Result<Vec<f32>, PredictorError>;
}

/// Summary of one training epoch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EpochSummary {
	/// Fraction of windows whose best-scoring index is the target.
	pub accuracy: f32,
	/// Number of windows the epoch went through.
	pub samples: usize,
}

/// A model the training loop can fit one epoch at a time.
pub trait Trainable {
	fn fit_epoch(&mut self, windows: &TrainingWindows) -> Result<EpochSummary>;
}

/// Index of the highest score; ties go to the lowest index.
///
/// Returns `None` for an empty slice or if any score is NaN.
pub fn argmax(scores: &[f32]) -> Option<usize> {
	let mut best: Option<(usize, f32)> = None;
	for (index, &score) in scores.iter().enumerate() {
		if score.is_nan() {
			return None;
		}
		match best {
			Some((_, best_score)) if score <= best_score => {}
			_ => best = Some((index, score)),
		}
	}
	best.map(|(index, _)| index)
}

/// Count-based predictor over window suffixes, with backoff.
///
/// Holds one [`ContextModel`] per order `0..=max_order`. Prediction uses the
/// longest context seen during training and falls back to shorter ones,
/// down to the unigram distribution.
///
/// The predictor receives normalized windows like any other predictor and
/// recovers the integer indices by multiplying back with `vocab_size`.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TransitionPredictor {
	sequence_length: usize,
	vocab_size: usize,
	/// `orders[n]` is the model of order `n`.
	orders: Vec<ContextModel>,
}

impl TransitionPredictor {
	/// Creates an untrained predictor.
	///
	/// `max_order` is clamped to `sequence_length`.
	///
	/// # Errors
	/// `InvalidConfig` if `sequence_length` or `vocab_size` is zero.
	pub fn new(sequence_length: usize, vocab_size: usize, max_order: usize) -> Result<Self> {
		if sequence_length == 0 {
			return Err(NoteGenError::InvalidConfig("sequence length must be greater than zero".to_owned()));
		}
		if vocab_size == 0 {
			return Err(NoteGenError::InvalidConfig("vocabulary size must be greater than zero".to_owned()));
		}
		let max_order = max_order.min(sequence_length);
		Ok(Self {
			sequence_length,
			vocab_size,
			orders: (0..=max_order).map(ContextModel::new).collect(),
		})
	}

	pub fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	pub fn max_order(&self) -> usize {
		self.orders.len() - 1
	}

	/// `true` once at least one epoch has been fitted.
	pub fn is_trained(&self) -> bool {
		self.orders.first().is_some_and(|unigram| !unigram.is_empty())
	}

	/// Scores for a window of raw indices.
	pub fn predict_indices(&self, window: &[usize]) -> Option<Vec<f32>> {
		self.orders
			.iter()
			.rev()
			.find_map(|model| model.predict(window, self.vocab_size))
	}

	fn recover_indices(&self, window: &[f32]) -> std::result::Result<Vec<usize>, PredictorError> {
		window
			.iter()
			.map(|&value| {
				if !(0.0..1.0).contains(&value) {
					return Err(format!("normalized value {} outside [0, 1)", value).into());
				}
				Ok(((value * self.vocab_size as f32).round() as usize).min(self.vocab_size - 1))
			})
			.collect()
	}

	/// Writes the predictor to `path` (postcard encoding).
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let bytes = postcard::to_stdvec(self)?;
		std::fs::write(&path, bytes).map_err(|err| NoteGenError::io(err, Some(path.as_ref().to_path_buf())))
	}

	/// Reads a predictor written by [`TransitionPredictor::save`].
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(&path).map_err(|err| NoteGenError::io(err, Some(path.as_ref().to_path_buf())))?;
		let predictor: Self = postcard::from_bytes(&bytes)?;
		predictor.check_shape()?;
		Ok(predictor)
	}

	/// Same shape rules as [`TransitionPredictor::new`], plus `orders[n]` of order `n`.
	fn check_shape(&self) -> Result<()> {
		let malformed = |reason: String| -> Result<()> {
			Err(NoteGenError::Serialization(format!("predictor artifact is malformed: {}", reason)))
		};
		if self.sequence_length == 0 {
			return malformed("sequence length is zero".to_owned());
		}
		if self.vocab_size == 0 {
			return malformed("vocabulary size is zero".to_owned());
		}
		if self.orders.is_empty() || self.orders.len() - 1 > self.sequence_length {
			return malformed(format!(
				"{} context models for windows of {}",
				self.orders.len(),
				self.sequence_length
			));
		}
		if let Some((n, model)) = self.orders.iter().enumerate().find(|(n, model)| model.order() != *n) {
			return malformed(format!("model {} has order {}", n, model.order()));
		}
		Ok(())
	}
}

impl Predictor for TransitionPredictor {
	fn input_len(&self) -> usize {
		self.sequence_length
	}

	fn predict(&self, window: &[f32]) -> std::result::Result<Vec<f32>, PredictorError> {
		if window.len() != self.sequence_length {
			return Err(format!("expected {} values, got {}", self.sequence_length, window.len()).into());
		}
		if !self.is_trained() {
			return Err("predictor has not been trained".into());
		}
		let indices = self.recover_indices(window)?;
		self.predict_indices(&indices)
			.ok_or_else(|| "no context matched the window".into())
	}
}

impl Trainable for TransitionPredictor {
	/// Rebuilds the transition tables from `windows`.
	///
	/// Every epoch starts from empty tables, so fitting several epochs on the
	/// same windows yields the same model.
	fn fit_epoch(&mut self, windows: &TrainingWindows) -> Result<EpochSummary> {
		if windows.sequence_length() != self.sequence_length || windows.vocab_size() != self.vocab_size {
			return Err(NoteGenError::InvalidConfig(format!(
				"windows ({} x {} classes) do not match predictor ({} x {} classes)",
				windows.sequence_length(),
				windows.vocab_size(),
				self.sequence_length,
				self.vocab_size
			)));
		}

		for model in &mut self.orders {
			*model = ContextModel::new(model.order());
		}
		for (window, target) in windows.pairs() {
			for model in &mut self.orders {
				model.add_observation(window, target);
			}
		}

		let hits = windows
			.pairs()
			.filter(|(window, target)| {
				self.predict_indices(window).and_then(|scores| argmax(&scores)) == Some(*target)
			})
			.count();

		let samples = windows.len();
		Ok(EpochSummary {
			accuracy: if samples == 0 { 0.0 } else { hits as f32 / samples as f32 },
			samples,
		})
	}
}
