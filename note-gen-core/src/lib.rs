//! Note sequence training-data pipeline and autoregressive generator.
//!
//! This crate provides:
//! - Ingestion of a directory of note-event files into one ordered corpus
//! - An invertible token vocabulary over the corpus' event alphabet
//! - Fixed-length, overlapping training windows with categorical targets
//! - A predictor seam, a reference count-based predictor and its training loop
//! - Autoregressive generation from a seed window
//! - Training progress snapshots for an external monitor
//!
//! The predictor is a black box behind the `Predictor` trait: any model that
//! scores the next vocabulary index from a normalized window can be plugged in.

/// Error taxonomy shared by every stage.
pub mod error;

/// Pipeline configuration (serializable, validated).
pub mod config;

/// Directory ingestion and event file parsers.
pub mod corpus;

/// Core models: vocabulary, windows, predictor, training, generation.
pub mod model;

/// Generated sequence exporters.
pub mod export;

/// End-to-end session tying the stages together.
pub mod pipeline;

/// I/O utilities (file listing, output paths, folders).
pub mod io;
