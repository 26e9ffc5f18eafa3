//! Writing generated sequences out.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use log::info;

use crate::error::{NoteGenError, Result};
use crate::io::build_output_path;
use crate::model::vocabulary::Token;

/// Consumes a generated sequence.
///
/// `prefix` is an output path without extension; implementations add their
/// own and return the path they wrote.
pub trait Exporter {
	fn export(&self, tokens: &[Token], prefix: &Path) -> Result<PathBuf>;
}

/// Writes one token per line to `<prefix>.txt`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TextExporter;

impl Exporter for TextExporter {
	fn export(&self, tokens: &[Token], prefix: &Path) -> Result<PathBuf> {
		let path = build_output_path(prefix, "txt").map_err(|err| NoteGenError::io(err, Some(prefix.to_path_buf())))?;
		let mut contents = tokens.join("\n");
		if !tokens.is_empty() {
			contents.push('\n');
		}
		fs::write(&path, contents).map_err(|err| NoteGenError::io(err, Some(path.clone())))?;
		info!("Exported {} notes to {:?}", tokens.len(), path);
		Ok(path)
	}
}

/// `dir/notes_result_<local time>` with a filesystem-safe, millisecond timestamp.
///
/// If a file in `dir` already uses that name (whatever its extension), a
/// `_1`, `_2`, ... suffix is added until the name is free.
pub fn timestamped_prefix<P: AsRef<Path>>(dir: P) -> PathBuf {
	let dir = dir.as_ref();
	let base = format!("notes_result_{}", Local::now().format("%Y-%m-%d_%H-%M-%S-%3f"));
	let taken = taken_stems(dir);
	let mut name = base.clone();
	let mut suffix = 0;
	while taken.iter().any(|stem| *stem == name) {
		suffix += 1;
		name = format!("{}_{}", base, suffix);
	}
	dir.join(name)
}

/// File stems already present in `dir`; empty if it cannot be read.
fn taken_stems(dir: &Path) -> Vec<String> {
	let Ok(entries) = fs::read_dir(dir) else {
		return Vec::new();
	};
	entries
		.filter_map(|entry| entry.ok())
		.filter_map(|entry| entry.path().file_stem().map(|stem| stem.to_string_lossy().to_string()))
		.collect()
}
