use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Represents a context state of a transition model.
///
/// A `State` corresponds to a fixed suffix of a window (`key`, as vocabulary
/// indices) and stores all observed transitions from this context to the
/// next index.
///
/// Conceptually, this is a node in a Markov chain where outgoing edges
/// are weighted by their number of observations.
///
/// ## Invariants
/// - All transitions belong to the same `key`
/// - Each transition occurrence count is strictly positive
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct State {
	/// Context the transitions start from.
	key: Vec<usize>,
	/// Outgoing transitions indexed by the next vocabulary index.
	/// Example: { 3 => 42, 0 => 3 }
	transitions: HashMap<usize, usize>,
}

impl State {
	/// Creates a new empty state for the given context.
	pub fn new(key: &[usize]) -> Self {
		Self {
			key: key.to_vec(),
			transitions: HashMap::new(),
		}
	}

	/// Records an occurrence of a transition toward `next`.
	pub fn add_transition(&mut self, next: usize) {
		*self.transitions.entry(next).or_insert(0) += 1;
	}

	/// Total number of observed transitions.
	pub fn total(&self) -> usize {
		self.transitions.values().sum()
	}

	/// Relative frequency of every vocabulary index, `vocab_size` entries.
	///
	/// Indices never observed from this context score `0.0`.
	/// Returns `None` if the state has no transitions.
	pub fn distribution(&self, vocab_size: usize) -> Option<Vec<f32>> {
		let total = self.total();
		if total == 0 {
			return None;
		}

		let mut scores = vec![0.0; vocab_size];
		for (&next, &occurrence) in &self.transitions {
			if let Some(score) = scores.get_mut(next) {
				*score = occurrence as f32 / total as f32;
			}
		}
		Some(scores)
	}
}
