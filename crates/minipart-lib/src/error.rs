//! Error types surfaced by the partitioning pipeline.
//!
//! There is no retry anywhere: configuration, I/O and format errors all
//! terminate the parse and leave partially built state to be dropped.

use std::path::PathBuf;
use thiserror::Error;

/// Errors returned while configuring or running a parse
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid build parameters (k/m out of range, count field too narrow)
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The input file could not be opened
    #[error("error opening '{path}': {source}")]
    Open {
        /// Path that failed to open
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// I/O failure on the input stream or a spill file
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Malformed input: bad header, length mismatch, non-ACGT base
    #[error("malformed input: {0}")]
    Format(String),
}
