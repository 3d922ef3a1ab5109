//! Error taxonomy of the SMD conversion core.
//!
//! Every failure is surfaced synchronously to the caller; this crate never
//! logs or prints. Batch-level skip-and-continue policies belong to the
//! caller.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SmdError {
    /// Header/body boundary marker missing, or the header markup is
    /// unparsable or lacks a required field.
    #[error("invalid SMD header: {0}")]
    Format(String),

    /// The file shape is valid SMD but outside the supported
    /// single-channel/single-series configuration.
    #[error("unsupported SMD layout: detector {detector} has {count} {kind}, expected 1")]
    UnsupportedFormat {
        detector: usize,
        kind: &'static str,
        count: usize,
    },

    /// Payload byte count disagrees with the shape implied by the header.
    /// Counts are in bytes, so a file truncated mid-sample is diagnosable.
    #[error("corrupt payload: holds {got} bytes, header implies {expected}")]
    CorruptData { expected: usize, got: usize },

    /// Requested detector ID out of range.
    #[error("invalid detector ID ({id}); file has {count} detector(s)")]
    InvalidDetector { id: usize, count: usize },

    /// Unrecognized spectral-axis unit string.
    #[error("invalid spectral unit ({0}); expected nm, cm-1 or GHz")]
    InvalidUnit(String),

    /// Replacement array shape differs from the parsed cube's shape.
    #[error("shape mismatch: new array is {got:?}, original is {expected:?}")]
    ShapeMismatch {
        expected: [usize; 4],
        got: [usize; 4],
    },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}
