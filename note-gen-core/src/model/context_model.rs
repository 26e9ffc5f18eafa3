use super::state::State;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fixed-order context model over vocabulary indices.
///
/// Stores one [`State`] per observed context of exactly `order` indices
/// (the last `order` entries of a window) and the transitions that
/// followed it.
///
/// # Invariants
/// - Each state in `states` corresponds to a unique context of length `order`
/// - All state transitions have occurrence counts >= 1
///
/// `order == 0` is the unigram model: a single empty context.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ContextModel {
	order: usize,
	states: HashMap<Vec<usize>, State>,
}

impl ContextModel {
	pub fn new(order: usize) -> Self {
		Self { order, states: HashMap::new() }
	}

	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of distinct contexts seen.
	pub fn len(&self) -> usize {
		self.states.len()
	}

	pub fn is_empty(&self) -> bool {
		self.states.is_empty()
	}

	/// Context of this model's order taken from the end of `window`.
	///
	/// Returns `None` if the window is shorter than the order.
	fn context<'w>(&self, window: &'w [usize]) -> Option<&'w [usize]> {
		window.len().checked_sub(self.order).map(|start| &window[start..])
	}

	/// Records that `next` followed `window`.
	///
	/// Windows shorter than the order are ignored.
	pub fn add_observation(&mut self, window: &[usize], next: usize) {
		let Some(context) = self.context(window) else {
			return;
		};
		self.states
			.entry(context.to_vec())
			.or_insert_with(|| State::new(context))
			.add_transition(next);
	}

	/// Distribution of the next index given `window`.
	///
	/// Returns `None` if the context was never observed.
	pub fn predict(&self, window: &[usize], vocab_size: usize) -> Option<Vec<f32>> {
		let context = self.context(window)?;
		self.states.get(context)?.distribution(vocab_size)
	}
}
