/// Maps a vocabulary index into `[0, 1)` for predictor input.
///
/// There is deliberately no inverse: decoding always goes through the
/// integer index kept next to the normalized value.
pub fn normalize(index: usize, vocab_size: usize) -> f32 {
	index as f32 / vocab_size as f32
}

/// Normalizes every index of a window.
pub fn normalize_window(window: &[usize], vocab_size: usize) -> Vec<f32> {
	window.iter().map(|&i| normalize(i, vocab_size)).collect()
}
