use log::debug;

use super::normalizer::normalize_window;
use super::predictor::{argmax, Predictor};
use super::vocabulary::{Token, Vocabulary};
use crate::error::{NoteGenError, Result};

/// Drives a predictor autoregressively from a seed window.
///
/// # Responsibilities
/// - Keep the sliding window as raw indices, normalizing only right before
///   each predictor call
/// - Pick the best-scoring index at each step (lowest index on ties)
/// - Decode the produced indices once generation is complete
///
/// # Invariants
/// - The window length equals `predictor.input_len()` at every step
/// - After step `k` the window is the previous window minus its first
///   element, plus the index chosen at step `k`
pub struct Generator<'a, P: Predictor> {
	predictor: &'a P,
	vocabulary: &'a Vocabulary,
}

impl<'a, P: Predictor> Generator<'a, P> {
	pub fn new(predictor: &'a P, vocabulary: &'a Vocabulary) -> Self {
		Self { predictor, vocabulary }
	}

	/// Produces `count` indices following `seed`.
	///
	/// `count == 0` returns an empty sequence without calling the predictor.
	///
	/// # Errors
	/// - `InvalidSeedLength` if `seed.len() != predictor.input_len()`
	/// - `IndexOutOfRange` if the seed holds an index outside the vocabulary
	/// - `PredictorContract` if the predictor fails or returns a distribution
	///   that is not one finite score per vocabulary index; nothing partial is
	///   returned in that case
	pub fn generate_indices(&self, seed: &[usize], count: usize) -> Result<Vec<usize>> {
		let expected = self.predictor.input_len();
		if seed.len() != expected {
			return Err(NoteGenError::InvalidSeedLength { expected, actual: seed.len() });
		}

		let vocab_size = self.vocabulary.len();
		if let Some(&index) = seed.iter().find(|&&i| i >= vocab_size) {
			return Err(NoteGenError::IndexOutOfRange { index, size: vocab_size });
		}

		let mut window = seed.to_vec();
		let mut output = Vec::new();

		for step in 0..count {
			let input = normalize_window(&window, vocab_size);
			let scores = self
				.predictor
				.predict(&input)
				.map_err(|err| NoteGenError::PredictorContract(format!("step {}: {}", step, err)))?;

			if scores.len() != vocab_size {
				return Err(NoteGenError::PredictorContract(format!(
					"step {}: expected {} scores, got {}",
					step,
					vocab_size,
					scores.len()
				)));
			}
			let next = argmax(&scores).ok_or_else(|| {
				NoteGenError::PredictorContract(format!("step {}: distribution contains NaN", step))
			})?;

			output.push(next);
			// A zero-length window stays empty.
			if !window.is_empty() {
				window.remove(0);
				window.push(next);
			}
		}

		debug!("Generated {} indices", output.len());
		Ok(output)
	}

	/// Produces `count` tokens following `seed`.
	///
	/// Same contract as [`Generator::generate_indices`]; the produced indices
	/// are decoded in order at the end.
	pub fn generate(&self, seed: &[usize], count: usize) -> Result<Vec<Token>> {
		let indices = self.generate_indices(seed, count)?;
		self.vocabulary.decode_many(&indices)
	}
}

/// Shorthand for `Generator::new(predictor, vocabulary).generate(seed, count)`.
pub fn generate<P: Predictor>(
	seed: &[usize],
	predictor: &P,
	vocabulary: &Vocabulary,
	count: usize,
) -> Result<Vec<Token>> {
	Generator::new(predictor, vocabulary).generate(seed, count)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::predictor::PredictorError;
	use crate::model::vocabulary::VocabularyOrder;
	use std::cell::RefCell;

	/// Always favours one index, and records every window it receives.
	struct FixedPredictor {
		input_len: usize,
		vocab_size: usize,
		favourite: usize,
		seen: RefCell<Vec<Vec<usize>>>,
	}

	impl FixedPredictor {
		fn new(input_len: usize, vocab_size: usize, favourite: usize) -> Self {
			Self { input_len, vocab_size, favourite, seen: RefCell::new(Vec::new()) }
		}

		fn calls(&self) -> usize {
			self.seen.borrow().len()
		}
	}

	impl Predictor for FixedPredictor {
		fn input_len(&self) -> usize {
			self.input_len
		}

		fn predict(&self, window: &[f32]) -> std::result::Result<Vec<f32>, PredictorError> {
			let indices = window.iter().map(|v| (v * self.vocab_size as f32).round() as usize).collect();
			self.seen.borrow_mut().push(indices);
			let mut scores = vec![0.1; self.vocab_size];
			scores[self.favourite] = 0.9;
			Ok(scores)
		}
	}

	struct ConstantPredictor(Vec<f32>);

	impl Predictor for ConstantPredictor {
		fn input_len(&self) -> usize {
			2
		}

		fn predict(&self, _window: &[f32]) -> std::result::Result<Vec<f32>, PredictorError> {
			Ok(self.0.clone())
		}
	}

	struct FailingPredictor;

	impl Predictor for FailingPredictor {
		fn input_len(&self) -> usize {
			2
		}

		fn predict(&self, _window: &[f32]) -> std::result::Result<Vec<f32>, PredictorError> {
			Err("model unavailable".into())
		}
	}

	fn vocabulary() -> Vocabulary {
		Vocabulary::fit(["A", "B", "C", "A", "B", "D"], VocabularyOrder::Encounter).expect("fit")
	}

	#[test]
	fn scenario_generates_d_twice() {
		let vocab = vocabulary();
		let predictor = FixedPredictor::new(2, 4, 3);
		let generator = Generator::new(&predictor, &vocab);

		let output = generator.generate(&[0, 1], 2).expect("generate");
		assert_eq!(output, vec!["D", "D"]);

		// Windows handed to the predictor: seed, then after step 0.
		assert_eq!(*predictor.seen.borrow(), vec![vec![0, 1], vec![1, 3]]);
		// A third step would receive the window left after step 1.
		predictor.seen.borrow_mut().clear();
		generator.generate(&[0, 1], 3).expect("generate");
		assert_eq!(predictor.seen.borrow()[2], vec![3, 3]);
	}

	#[test]
	fn window_slides_by_one_each_step() {
		let vocab = vocabulary();
		let predictor = FixedPredictor::new(3, 4, 2);
		let seed = [3, 0, 1];
		let produced = Generator::new(&predictor, &vocab).generate_indices(&seed, 5).expect("generate");

		let seen = predictor.seen.borrow();
		assert_eq!(seen[0], seed.to_vec());
		for k in 1..seen.len() {
			assert_eq!(seen[k].len(), 3);
			let mut expected = seen[k - 1][1..].to_vec();
			expected.push(produced[k - 1]);
			assert_eq!(seen[k], expected);
		}
	}

	#[test]
	fn zero_count_never_calls_the_predictor() {
		let vocab = vocabulary();
		let predictor = FixedPredictor::new(2, 4, 3);
		let output = generate(&[0, 1], &predictor, &vocab, 0).expect("generate");
		assert!(output.is_empty());
		assert_eq!(predictor.calls(), 0);
	}

	#[test]
	fn seed_length_must_match_predictor() {
		let vocab = vocabulary();
		let predictor = FixedPredictor::new(2, 4, 3);
		let err = generate(&[0, 1, 2], &predictor, &vocab, 1).expect_err("bad seed");
		assert!(matches!(err, NoteGenError::InvalidSeedLength { expected: 2, actual: 3 }));
		assert_eq!(predictor.calls(), 0);
	}

	#[test]
	fn seed_indices_must_be_in_vocabulary() {
		let vocab = vocabulary();
		let predictor = FixedPredictor::new(2, 4, 3);
		let err = generate(&[0, 7], &predictor, &vocab, 1).expect_err("bad index");
		assert!(matches!(err, NoteGenError::IndexOutOfRange { index: 7, size: 4 }));
	}

	#[test]
	fn ties_resolve_to_lowest_index() {
		let vocab = vocabulary();
		let predictor = ConstantPredictor(vec![0.1, 0.4, 0.1, 0.4]);
		let output = generate(&[0, 0], &predictor, &vocab, 3).expect("generate");
		assert_eq!(output, vec!["B", "B", "B"]);
	}

	#[test]
	fn generation_is_deterministic() {
		let vocab = vocabulary();
		let predictor = ConstantPredictor(vec![0.3, 0.2, 0.4, 0.1]);
		let a = generate(&[1, 2], &predictor, &vocab, 10).expect("a");
		let b = generate(&[1, 2], &predictor, &vocab, 10).expect("b");
		assert_eq!(a, b);
	}

	#[test]
	fn malformed_distributions_abort() {
		let vocab = vocabulary();

		let short = ConstantPredictor(vec![0.5, 0.5]);
		let err = generate(&[0, 1], &short, &vocab, 2).expect_err("short distribution");
		assert!(matches!(err, NoteGenError::PredictorContract(msg) if msg.contains("expected 4 scores")));

		let nan = ConstantPredictor(vec![0.5, f32::NAN, 0.0, 0.0]);
		assert!(matches!(generate(&[0, 1], &nan, &vocab, 1), Err(NoteGenError::PredictorContract(_))));

		let err = generate(&[0, 1], &FailingPredictor, &vocab, 1).expect_err("failing predictor");
		assert!(matches!(err, NoteGenError::PredictorContract(msg) if msg.contains("model unavailable")));
	}

	#[test]
	fn huge_count_fails_at_the_first_step() {
		let vocab = vocabulary();
		let err = generate(&[0, 1], &FailingPredictor, &vocab, usize::MAX).expect_err("failing predictor");
		assert!(matches!(err, NoteGenError::PredictorContract(msg) if msg.starts_with("step 0:")));
	}
}
