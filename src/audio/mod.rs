//! Audio preparation layer
//!
//! Everything that touches the input file before feature extraction:
//! format normalisation through an external converter, duration checks,
//! in-place trimming, decoding to mono PCM and resampling.

pub mod convert;
pub mod decode;
pub mod duration;
pub mod resample;
pub mod trim;

pub use convert::{normalize_format, CANONICAL_EXTENSION};
pub use decode::{decode_to_mono, DecodedAudio};
pub use duration::{probe_duration, validate_duration};
pub use resample::resample_mono;
pub use trim::{trim_to_window, TrimmedWindow};
