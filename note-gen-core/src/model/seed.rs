use rand::Rng;

use super::vocabulary::{Token, Vocabulary};
use super::window::TrainingWindows;
use crate::error::{NoteGenError, Result};

/// Strategy used to select the seed window before generation begins.
///
/// # Variants
/// - `Random`: a uniformly random training window.
/// - `Window(usize)`: the training window starting at that corpus position.
/// - `Custom(Vec<Token>)`: explicit tokens, encoded with the vocabulary.
#[derive(Clone, Debug, PartialEq)]
pub enum StartSeed {
	Random,
	Window(usize),
	Custom(Vec<Token>),
}

impl StartSeed {
	/// Parses the textual form used by outer surfaces.
	///
	/// - `"random"` → `Random`
	/// - `"window:<k>"` → `Window(k)`
	/// - `"custom:<t1>,<t2>,..."` → `Custom([t1, t2, ...])`
	pub fn parse(value: &str) -> Result<Self> {
		let lower = value.to_ascii_lowercase();
		if lower == "random" {
			return Ok(Self::Random);
		}
		if lower.starts_with("window:") {
			let index = &value["window:".len()..];
			return index
				.parse::<usize>()
				.map(Self::Window)
				.map_err(|_| NoteGenError::InvalidConfig(format!("window seed must be an integer, got {:?}", index)));
		}
		if lower.starts_with("custom:") {
			let tokens: Vec<Token> = value["custom:".len()..]
				.split(',')
				.map(str::trim)
				.filter(|t| !t.is_empty())
				.map(str::to_owned)
				.collect();
			if tokens.is_empty() {
				return Err(NoteGenError::InvalidConfig("custom seed cannot be empty".to_owned()));
			}
			return Ok(Self::Custom(tokens));
		}
		Err(NoteGenError::InvalidConfig(format!(
			"seed must be 'random', 'window:<k>' or 'custom:<tokens>', got {:?}",
			value
		)))
	}

	/// Resolves the strategy into a window of raw indices.
	///
	/// # Errors
	/// - `IndexOutOfRange` if `Window(k)` is past the last window
	/// - `UnknownToken` if a custom token is not in the vocabulary
	/// - `EmptyCorpus` if `Random` is asked of an empty window set
	pub fn resolve(&self, windows: &TrainingWindows, vocabulary: &Vocabulary) -> Result<Vec<usize>> {
		match self {
			Self::Random => {
				if windows.is_empty() {
					return Err(NoteGenError::EmptyCorpus("no training window to seed from".to_owned()));
				}
				let start = rand::rng().random_range(0..windows.len());
				Ok(windows.windows()[start].clone())
			}
			Self::Window(start) => windows.windows().get(*start).cloned().ok_or(NoteGenError::IndexOutOfRange {
				index: *start,
				size: windows.len(),
			}),
			Self::Custom(tokens) => vocabulary.encode_many(tokens),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::vocabulary::VocabularyOrder;
	use crate::model::window::build_windows;

	fn fixtures() -> (TrainingWindows, Vocabulary) {
		let corpus = ["A", "B", "C", "A", "B", "D"];
		let vocab = Vocabulary::fit(corpus, VocabularyOrder::Encounter).expect("fit");
		(build_windows(&corpus, &vocab, 2).expect("windows"), vocab)
	}

	#[test]
	fn parse_accepts_every_form() {
		assert_eq!(StartSeed::parse("random").unwrap(), StartSeed::Random);
		assert_eq!(StartSeed::parse("Window:3").unwrap(), StartSeed::Window(3));
		assert_eq!(
			StartSeed::parse("custom:A, B").unwrap(),
			StartSeed::Custom(vec!["A".to_owned(), "B".to_owned()])
		);
		assert!(StartSeed::parse("window:x").is_err());
		assert!(StartSeed::parse("custom:").is_err());
		assert!(StartSeed::parse("first").is_err());
	}

	#[test]
	fn resolve_picks_training_windows() {
		let (windows, vocab) = fixtures();
		assert_eq!(StartSeed::Window(1).resolve(&windows, &vocab).unwrap(), vec![1, 2]);
		assert!(matches!(
			StartSeed::Window(4).resolve(&windows, &vocab),
			Err(NoteGenError::IndexOutOfRange { index: 4, size: 4 })
		));

		for _ in 0..20 {
			let seed = StartSeed::Random.resolve(&windows, &vocab).unwrap();
			assert!(windows.windows().contains(&seed));
		}
	}

	#[test]
	fn resolve_encodes_custom_tokens() {
		let (windows, vocab) = fixtures();
		let seed = StartSeed::Custom(vec!["D".to_owned(), "A".to_owned()]);
		assert_eq!(seed.resolve(&windows, &vocab).unwrap(), vec![3, 0]);

		let unknown = StartSeed::Custom(vec!["Q".to_owned()]);
		assert!(matches!(unknown.resolve(&windows, &vocab), Err(NoteGenError::UnknownToken(_))));
	}
}
