use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{NoteGenError, Result};

/// Snapshot of training progress, overwritten at every epoch boundary.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct TrainingProgress {
	/// Last completed epoch.
	pub epoch: usize,
	pub total_epochs: usize,
	pub timestamp: DateTime<Utc>,
}

/// Destination of progress snapshots (an external monitor reads from it).
pub trait ProgressSink {
	fn publish(&mut self, progress: &TrainingProgress) -> Result<()>;
}

/// Overwrites a JSON file with the latest snapshot.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
	path: PathBuf,
}

impl JsonFileSink {
	pub fn new<P: AsRef<Path>>(path: P) -> Self {
		Self { path: path.as_ref().to_path_buf() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}
}

impl ProgressSink for JsonFileSink {
	fn publish(&mut self, progress: &TrainingProgress) -> Result<()> {
		let json = serde_json::to_string_pretty(progress)?;
		std::fs::write(&self.path, json).map_err(|err| NoteGenError::io(err, Some(self.path.clone())))
	}
}

/// Logs each snapshot at `info` level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl ProgressSink for LogSink {
	fn publish(&mut self, progress: &TrainingProgress) -> Result<()> {
		info!("Epoch {}/{} finished at {}", progress.epoch, progress.total_epochs, progress.timestamp);
		Ok(())
	}
}

/// Keeps every snapshot in memory.
impl ProgressSink for Vec<TrainingProgress> {
	fn publish(&mut self, progress: &TrainingProgress) -> Result<()> {
		self.push(progress.clone());
		Ok(())
	}
}

/// Publishes to both sinks, first one first.
impl<A: ProgressSink, B: ProgressSink> ProgressSink for (A, B) {
	fn publish(&mut self, progress: &TrainingProgress) -> Result<()> {
		self.0.publish(progress)?;
		self.1.publish(progress)
	}
}

/// Tracks the current training progress and forwards it to a sink.
///
/// Called synchronously by the training loop, on the training thread.
#[derive(Debug)]
pub struct ProgressReporter<S: ProgressSink> {
	sink: S,
	current: Option<TrainingProgress>,
}

impl<S: ProgressSink> ProgressReporter<S> {
	pub fn new(sink: S) -> Self {
		Self { sink, current: None }
	}

	/// Records the end of `epoch` out of `total_epochs` and publishes it.
	pub fn on_epoch_end(&mut self, epoch: usize, total_epochs: usize) -> Result<()> {
		let progress = TrainingProgress {
			epoch,
			total_epochs,
			timestamp: Utc::now(),
		};
		self.sink.publish(&progress)?;
		self.current = Some(progress);
		Ok(())
	}

	/// Latest snapshot, `None` before the first epoch ends.
	pub fn current(&self) -> Option<&TrainingProgress> {
		self.current.as_ref()
	}

	pub fn sink(&self) -> &S {
		&self.sink
	}

	pub fn into_sink(self) -> S {
		self.sink
	}
}

/// Reads the snapshot a [`JsonFileSink`] wrote.
pub fn read_progress<P: AsRef<Path>>(path: P) -> Result<TrainingProgress> {
	let path = path.as_ref();
	let json = std::fs::read_to_string(path).map_err(|err| NoteGenError::io(err, Some(path.to_path_buf())))?;
	Ok(serde_json::from_str(&json)?)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn snapshot_is_overwritten_each_epoch() {
		let mut reporter = ProgressReporter::new(Vec::<TrainingProgress>::new());
		assert!(reporter.current().is_none());

		reporter.on_epoch_end(1, 3).expect("epoch 1");
		reporter.on_epoch_end(2, 3).expect("epoch 2");

		let current = reporter.current().expect("snapshot");
		assert_eq!((current.epoch, current.total_epochs), (2, 3));

		let published = reporter.into_sink();
		assert_eq!(published.len(), 2);
		assert!(published[0].timestamp <= published[1].timestamp);
	}

	#[test]
	fn json_file_holds_the_latest_snapshot() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("state.json");
		let mut reporter = ProgressReporter::new(JsonFileSink::new(&path));

		reporter.on_epoch_end(1, 4).expect("epoch 1");
		reporter.on_epoch_end(2, 4).expect("epoch 2");

		let raw: serde_json::Value =
			serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
		assert_eq!(raw["epoch"], 2);
		assert_eq!(raw["total_epochs"], 4);
		assert!(raw["timestamp"].is_string());

		let progress = read_progress(&path).expect("read progress");
		assert_eq!(Some(&progress), reporter.current());
	}

	#[test]
	fn paired_sinks_both_receive_snapshots() {
		let dir = tempdir().expect("tempdir");
		let path = dir.path().join("state.json");
		let mut reporter = ProgressReporter::new((JsonFileSink::new(&path), LogSink));

		reporter.on_epoch_end(1, 2).expect("epoch 1");
		assert_eq!(reporter.sink().0.path(), path.as_path());
		assert_eq!(read_progress(&path).expect("read progress").epoch, 1);

		let mut log_only = ProgressReporter::new(LogSink);
		log_only.on_epoch_end(2, 2).expect("log sink never fails");
		assert_eq!(log_only.current().map(|p| p.epoch), Some(2));
	}

	#[test]
	fn sink_failure_is_reported() {
		let dir = tempdir().expect("tempdir");
		let mut reporter = ProgressReporter::new(JsonFileSink::new(dir.path().join("missing").join("state.json")));
		let err = reporter.on_epoch_end(1, 1).expect_err("missing folder");
		assert!(matches!(err, NoteGenError::Io { .. }));
		assert!(reporter.current().is_none());
	}
}
