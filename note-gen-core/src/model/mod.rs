//! Token-level modelling: vocabulary, training windows, prediction and generation.
//!
//! This module provides, leaves first:
//! - The token/index bijection (`Vocabulary`)
//! - Index normalization for predictor input
//! - Fixed-length training windows with one-hot targets (`TrainingWindows`)
//! - The predictor seam (`Predictor`, `Trainable`) and a count-based predictor
//! - The training loop and its progress reporting
//! - Seed selection and autoregressive generation (`Generator`)

/// Bidirectional token/index mapping fitted on a corpus.
///
/// Supports encounter or sorted ordering and binary persistence.
pub mod vocabulary;

/// Index to `[0, 1)` scaling applied right before prediction.
pub mod normalizer;

/// Sliding windows (stride 1) over an encoded corpus, with one-hot targets.
pub mod window;

/// Predictor and trainable traits, argmax, and the transition predictor.
pub mod predictor;

/// Fixed-order context model used by the transition predictor.
///
/// Not exposed publicly.
mod context_model;

/// Internal representation of one context and its outgoing transitions.
///
/// Not exposed publicly.
mod state;

/// Epoch loop driving a `Trainable` model.
pub mod training;

/// Per-epoch training progress snapshots and their sinks.
pub mod progress;

/// Seed window selection strategies.
pub mod seed;

/// Autoregressive generation under the sliding-window invariant.
pub mod generator;
