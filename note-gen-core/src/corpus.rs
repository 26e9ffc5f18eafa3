//! Reading a directory of note-event files into one ordered corpus.

use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::config::ParseErrorPolicy;
use crate::error::{NoteGenError, Result};
use crate::io::{list_files, read_file};
use crate::model::vocabulary::Token;

/// Error type a parser may return; wrapped into `FileParse`.
pub type ParseError = Box<dyn std::error::Error + Send + Sync>;

/// Turns one input file into its events, in chronological order.
pub trait EventParser {
	fn parse_file(&self, path: &Path) -> std::result::Result<Vec<Token>, ParseError>;
}

/// One token per non-empty line, trimmed.
#[derive(Debug, Default, Clone, Copy)]
pub struct LineParser;

impl EventParser for LineParser {
	fn parse_file(&self, path: &Path) -> std::result::Result<Vec<Token>, ParseError> {
		Ok(read_file(path)?
			.into_iter()
			.map(|line| line.trim().to_owned())
			.filter(|line| !line.is_empty())
			.collect())
	}
}

/// One JSON event record per non-empty line.
///
/// The token is the record's compact JSON text with object keys in sorted
/// order, so records holding the same fields map to the same token whatever
/// key order the file used.
#[derive(Debug, Default, Clone, Copy)]
pub struct JsonlParser;

impl EventParser for JsonlParser {
	fn parse_file(&self, path: &Path) -> std::result::Result<Vec<Token>, ParseError> {
		let mut tokens = Vec::new();
		for (number, line) in read_file(path)?.iter().enumerate() {
			let line = line.trim();
			if line.is_empty() {
				continue;
			}
			let record: serde_json::Value =
				serde_json::from_str(line).map_err(|err| format!("line {}: {}", number + 1, err))?;
			tokens.push(record.to_string());
		}
		Ok(tokens)
	}
}

/// Concatenated tokens of every ingested file.
#[derive(Debug, Clone, PartialEq)]
pub struct Corpus {
	/// Tokens in file-enumeration order; no separator between files.
	pub tokens: Vec<Token>,
	/// Files that contributed at least one token, in enumeration order.
	pub files: Vec<PathBuf>,
	/// Files that failed to parse under `ParseErrorPolicy::Skip`.
	pub skipped: Vec<PathBuf>,
}

impl Corpus {
	pub fn len(&self) -> usize {
		self.tokens.len()
	}

	pub fn is_empty(&self) -> bool {
		self.tokens.is_empty()
	}
}

/// Ingests every file of `dir` (lexical order by file name).
///
/// - `extension`: only files with that extension are read
/// - `policy`: what to do when a file fails to parse
///
/// Files are read and parsed one at a time.
///
/// # Errors
/// - `Io` if the directory cannot be listed
/// - `FileParse` naming the first failing file, under `ParseErrorPolicy::Fail`
/// - `EmptyCorpus` if no file yields a token
pub fn ingest<P: EventParser>(
	dir: &Path,
	parser: &P,
	extension: Option<&str>,
	policy: ParseErrorPolicy,
) -> Result<Corpus> {
	let paths = list_files(dir, extension)?;
	info!("Ingesting {} files from {:?}", paths.len(), dir);

	let mut corpus = Corpus { tokens: Vec::new(), files: Vec::new(), skipped: Vec::new() };
	for path in paths {
		match parser.parse_file(&path) {
			Ok(tokens) => {
				debug!("Parsed {:?}: {} events", path, tokens.len());
				if !tokens.is_empty() {
					corpus.tokens.extend(tokens);
					corpus.files.push(path);
				}
			}
			Err(err) => match policy {
				ParseErrorPolicy::Fail => {
					return Err(NoteGenError::FileParse { path, reason: err.to_string() });
				}
				ParseErrorPolicy::Skip => {
					warn!("Skipping {:?}: {}", path, err);
					corpus.skipped.push(path);
				}
			},
		}
	}

	if corpus.is_empty() {
		return Err(NoteGenError::EmptyCorpus(format!("no events found in {:?}", dir)));
	}

	info!("Got corpus of {} events from {} files", corpus.len(), corpus.files.len());
	Ok(corpus)
}
