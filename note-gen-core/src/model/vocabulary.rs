use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NoteGenError, Result};

/// One musical event, opaque to the pipeline.
pub type Token = String;

/// Order in which distinct tokens receive their indices.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum VocabularyOrder {
	/// First occurrence in the stream gets the next free index.
	Encounter,
	/// Indices follow the lexical order of the tokens.
	Sorted,
}

/// Bijection between the distinct tokens of a corpus and `[0, len)`.
///
/// Built once with [`Vocabulary::fit`] and never mutated afterwards.
/// Indices are only meaningful for the corpus the vocabulary was fitted on;
/// persist the vocabulary with [`Vocabulary::save`] to reuse them across runs.
///
/// # Invariants
/// - `tokens[index_of[t]] == t` for every token `t`
/// - `tokens` holds no duplicates and is never empty
#[derive(Clone, Debug, PartialEq)]
pub struct Vocabulary {
	order: VocabularyOrder,
	tokens: Vec<Token>,
	index_of: HashMap<Token, usize>,
}

/// On-disk form. The reverse map is rebuilt (and checked) on load.
#[derive(Serialize, Deserialize)]
struct VocabularyArtifact {
	order: VocabularyOrder,
	tokens: Vec<Token>,
}

impl Vocabulary {
	/// Builds the vocabulary from an ordered token stream.
	///
	/// # Errors
	/// `EmptyCorpus` if the stream yields no token.
	pub fn fit<I, S>(stream: I, order: VocabularyOrder) -> Result<Self>
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let mut tokens: Vec<Token> = Vec::new();
		let mut index_of: HashMap<Token, usize> = HashMap::new();

		for token in stream {
			let token = token.as_ref();
			if !index_of.contains_key(token) {
				index_of.insert(token.to_owned(), tokens.len());
				tokens.push(token.to_owned());
			}
		}

		if tokens.is_empty() {
			return Err(NoteGenError::EmptyCorpus("cannot fit a vocabulary on an empty token stream".to_owned()));
		}

		if order == VocabularyOrder::Sorted {
			tokens.sort_unstable();
			for (index, token) in tokens.iter().enumerate() {
				index_of.insert(token.clone(), index);
			}
		}

		Ok(Self { order, tokens, index_of })
	}

	/// Number of distinct tokens.
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	/// Always `false` for a fitted vocabulary; provided for API symmetry.
	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}

	pub fn order(&self) -> VocabularyOrder {
		self.order
	}

	/// Tokens in index order.
	pub fn tokens(&self) -> &[Token] {
		&self.tokens
	}

	/// Returns the index of `token`.
	///
	/// # Errors
	/// `UnknownToken` if the token was not seen at fit time.
	pub fn encode(&self, token: &str) -> Result<usize> {
		self.index_of
			.get(token)
			.copied()
			.ok_or_else(|| NoteGenError::UnknownToken(token.to_owned()))
	}

	/// Encodes a whole sequence, failing on the first unknown token.
	pub fn encode_many<S: AsRef<str>>(&self, tokens: &[S]) -> Result<Vec<usize>> {
		tokens.iter().map(|t| self.encode(t.as_ref())).collect()
	}

	/// Returns the token stored at `index`.
	///
	/// # Errors
	/// `IndexOutOfRange` if `index >= len()`.
	pub fn decode(&self, index: usize) -> Result<&Token> {
		self.tokens.get(index).ok_or(NoteGenError::IndexOutOfRange {
			index,
			size: self.tokens.len(),
		})
	}

	/// Decodes a sequence of indices, in order.
	///
	/// Same semantics as calling [`Vocabulary::decode`] on each element;
	/// the first failure aborts the whole call.
	pub fn decode_many(&self, indices: &[usize]) -> Result<Vec<Token>> {
		indices.iter().map(|&i| self.decode(i).cloned()).collect()
	}

	/// Writes the vocabulary to `path` (postcard encoding).
	pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
		let artifact = VocabularyArtifact { order: self.order, tokens: self.tokens.clone() };
		let bytes = postcard::to_stdvec(&artifact)?;
		std::fs::write(&path, bytes).map_err(|err| NoteGenError::io(err, Some(path.as_ref().to_path_buf())))
	}

	/// Reads a vocabulary written by [`Vocabulary::save`].
	///
	/// # Errors
	/// `Serialization` if the artifact is empty or holds duplicate tokens.
	pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
		let bytes = std::fs::read(&path).map_err(|err| NoteGenError::io(err, Some(path.as_ref().to_path_buf())))?;
		let artifact: VocabularyArtifact = postcard::from_bytes(&bytes)?;

		if artifact.tokens.is_empty() {
			return Err(NoteGenError::Serialization("vocabulary artifact holds no token".to_owned()));
		}

		let mut index_of = HashMap::with_capacity(artifact.tokens.len());
		for (index, token) in artifact.tokens.iter().enumerate() {
			if index_of.insert(token.clone(), index).is_some() {
				return Err(NoteGenError::Serialization(format!("duplicate token {:?} in vocabulary artifact", token)));
			}
		}

		Ok(Self { order: artifact.order, tokens: artifact.tokens, index_of })
	}
}
