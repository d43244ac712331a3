//! Classification run configuration

use crate::classifier::SegmentStrategy;
use crate::features::FeatureConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for one classification run
#[derive(Debug, Clone)]
pub struct ClassifyConfig {
    /// Audio file to classify (overwritten by the trimmer)
    pub input: PathBuf,

    /// Text report destination, replaced on every run
    pub output: PathBuf,

    /// Optional JSON report destination
    pub json_output: Option<PathBuf>,

    /// Inputs shorter than this are rejected
    pub min_duration: Duration,

    /// Length of the window kept around the midpoint
    pub window: Duration,

    /// Number of ranked genres to report
    pub top_n: usize,

    /// External converter used for non-WAV input
    pub converter: String,

    pub features: FeatureConfig,

    pub strategy: SegmentStrategy,
}

impl ClassifyConfig {
    pub fn new(input: PathBuf, output: PathBuf) -> Self {
        Self {
            input,
            output,
            json_output: None,
            min_duration: Duration::from_secs(30),
            window: Duration::from_secs(30),
            top_n: 3,
            converter: "ffmpeg".to_string(),
            features: FeatureConfig::default(),
            strategy: SegmentStrategy::default(),
        }
    }

    pub fn with_json_output(mut self, path: PathBuf) -> Self {
        self.json_output = Some(path);
        self
    }

    pub fn with_min_duration(mut self, min_duration: Duration) -> Self {
        self.min_duration = min_duration;
        self
    }

    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_converter(mut self, converter: impl Into<String>) -> Self {
        self.converter = converter.into();
        self
    }

    pub fn with_features(mut self, features: FeatureConfig) -> Self {
        self.features = features;
        self
    }

    pub fn with_strategy(mut self, strategy: SegmentStrategy) -> Self {
        self.strategy = strategy;
        self
    }
}
