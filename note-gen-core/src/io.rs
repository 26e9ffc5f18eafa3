use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::{fs, io};

use log::info;

use crate::error::{NoteGenError, Result};

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub(crate) fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `output/notes_result` + `"txt"` → `output/notes_result.txt`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_name = input_path
		.file_name()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(format!("{}.{}", file_name.to_string_lossy(), output_extension));

	Ok(output)
}

/// Lists the regular files of a directory, sorted lexically by file name.
///
/// - `extension`: when set, only files with that extension are returned
/// - Subdirectories are ignored
/// - Returns full paths
pub fn list_files<P: AsRef<Path>>(dir: P, extension: Option<&str>) -> Result<Vec<PathBuf>> {
	let dir = dir.as_ref();
	let mut files = Vec::new();

	for entry in fs::read_dir(dir).map_err(|err| NoteGenError::io(err, Some(dir.to_path_buf())))? {
		let entry = entry.map_err(|err| NoteGenError::io(err, Some(dir.to_path_buf())))?;
		let path = entry.path();

		if !path.is_file() {
			continue;
		}
		match extension {
			Some(ext) if path.extension() != Some(std::ffi::OsStr::new(ext)) => continue,
			_ => files.push(path),
		}
	}

	files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
	Ok(files)
}

/// Makes sure an output folder exists, creating it (and its parents) if missing.
pub fn validate_folder<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
	let path = path.as_ref();
	if !path.exists() {
		info!("Missing path {:?} - creating it.", path);
		fs::create_dir_all(path).map_err(|err| NoteGenError::io(err, Some(path.to_path_buf())))?;
	}
	Ok(path.to_path_buf())
}
