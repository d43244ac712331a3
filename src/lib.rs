//! Genre Classifier - single-file music genre classification
//!
//! This library normalises an audio file, trims it to a window around its
//! midpoint, extracts MFCC features and runs them through a pre-trained
//! convolutional network to rank the ten GTZAN genres.

pub mod audio;
pub mod classifier;
pub mod error;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod report;

pub use error::ClassifyError;
pub use pipeline::config::ClassifyConfig;
pub use pipeline::runner::ClassifyPipeline;
