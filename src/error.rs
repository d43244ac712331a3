//! Error conditions callers may want to match on
//!
//! Everything else is reported through `anyhow` with context attached at the
//! I/O boundary.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("{path:?} is too short ({duration_secs:.2}s). Audio must be at least {min_secs} seconds.")]
    TooShort {
        path: PathBuf,
        duration_secs: f64,
        min_secs: f64,
    },

    #[error("converter `{program}` failed on {input:?} ({status})")]
    ConversionFailed {
        program: String,
        input: PathBuf,
        status: String,
    },

    #[error("unsupported WAV sample format: {0}")]
    UnsupportedFormat(String),

    #[error("not enough audio for one segment: {available} samples, need {required}")]
    NotEnoughAudio { available: usize, required: usize },

    #[error("feature matrix is {actual:?}, model expects {expected:?}")]
    FeatureShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    #[error("model returned {actual} probabilities, expected {expected}")]
    ProbabilityCount { expected: usize, actual: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
