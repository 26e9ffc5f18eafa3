use log::info;

use super::predictor::{EpochSummary, Trainable};
use super::progress::{ProgressReporter, ProgressSink};
use super::window::TrainingWindows;
use crate::error::{NoteGenError, Result};

/// Runs `epochs` training epochs over `windows`.
///
/// The reporter is notified after every epoch with 1-based epoch numbers.
/// Returns the summary of each epoch, in order.
///
/// # Errors
/// `InvalidConfig` if `epochs` is zero; otherwise the first error raised by
/// the model or the reporter's sink.
pub fn train<T, S>(
	model: &mut T,
	windows: &TrainingWindows,
	epochs: usize,
	reporter: &mut ProgressReporter<S>,
) -> Result<Vec<EpochSummary>>
where
	T: Trainable,
	S: ProgressSink,
{
	if epochs == 0 {
		return Err(NoteGenError::InvalidConfig("epochs must be greater than zero".to_owned()));
	}

	info!("Fitting model on {} windows for {} epochs...", windows.len(), epochs);
	let mut summaries = Vec::new();
	for epoch in 1..=epochs {
		let summary = model.fit_epoch(windows)?;
		info!("Epoch {}/{}: accuracy {:.4} over {} windows", epoch, epochs, summary.accuracy, summary.samples);
		reporter.on_epoch_end(epoch, epochs)?;
		summaries.push(summary);
	}
	Ok(summaries)
}
