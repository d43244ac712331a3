//! Feature extraction
//!
//! Loads the trimmed audio as mono at the target rate, splits the expected
//! track length into equal segments and computes one MFCC matrix per
//! complete segment.

pub mod mfcc;

pub use mfcc::{MfccConfig, MfccExtractor};

use crate::audio::{decode_to_mono, resample_mono};
use crate::error::ClassifyError;
use anyhow::Result;
use ndarray::Array2;
use rayon::prelude::*;
use std::path::Path;

/// Feature extraction parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeatureConfig {
    /// Rate the audio is resampled to before analysis
    pub sample_rate: u32,
    /// Assumed track length the segments are cut from
    pub track_duration_secs: u32,
    pub n_mfcc: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub num_segments: usize,
    pub n_mels: usize,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 22_050,
            track_duration_secs: 30,
            n_mfcc: 13,
            n_fft: 2048,
            hop_length: 512,
            num_segments: 10,
            n_mels: 128,
        }
    }
}

impl FeatureConfig {
    pub fn validate(&self) -> Result<(), ClassifyError> {
        if self.sample_rate == 0 || self.track_duration_secs == 0 {
            return Err(ClassifyError::InvalidConfig(
                "sample rate and track duration must be non-zero".into(),
            ));
        }
        if self.num_segments == 0 {
            return Err(ClassifyError::InvalidConfig(
                "at least one segment is required".into(),
            ));
        }
        if self.samples_per_segment() == 0 {
            return Err(ClassifyError::InvalidConfig(format!(
                "{} segments leave no samples per segment",
                self.num_segments
            )));
        }
        if self.n_mfcc == 0 || self.n_mfcc > self.n_mels {
            return Err(ClassifyError::InvalidConfig(format!(
                "n_mfcc must be between 1 and n_mels ({})",
                self.n_mels
            )));
        }
        if self.n_fft == 0 || self.hop_length == 0 {
            return Err(ClassifyError::InvalidConfig(
                "n_fft and hop_length must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Samples in one segment of the assumed track length
    pub fn samples_per_segment(&self) -> usize {
        self.sample_rate as usize * self.track_duration_secs as usize / self.num_segments
    }

    /// Shape of one segment's feature matrix: (frames, n_mfcc)
    pub fn segment_shape(&self) -> (usize, usize) {
        (1 + self.samples_per_segment() / self.hop_length, self.n_mfcc)
    }

    fn mfcc_config(&self) -> MfccConfig {
        MfccConfig {
            sample_rate: self.sample_rate,
            n_mfcc: self.n_mfcc,
            n_fft: self.n_fft,
            hop_length: self.hop_length,
            n_mels: self.n_mels,
        }
    }
}

/// Computes per-segment MFCC matrices
pub struct FeatureExtractor {
    config: FeatureConfig,
    mfcc: MfccExtractor,
}

impl FeatureExtractor {
    pub fn new(config: FeatureConfig) -> Result<Self> {
        config.validate()?;
        let mfcc = MfccExtractor::new(config.mfcc_config())?;
        Ok(Self { config, mfcc })
    }

    /// Decode, resample and segment an audio file
    pub fn extract_file(&self, path: &Path) -> Result<Vec<Array2<f32>>> {
        let audio = decode_to_mono(path)?;
        log::debug!("Loaded {:.2}s from {:?}", audio.duration_secs(), path);
        let signal = resample_mono(&audio.samples, audio.sample_rate, self.config.sample_rate)?;
        self.extract_segments(&signal)
    }

    /// MFCC matrices for every complete segment, in segment order
    ///
    /// At most `num_segments` segments are taken. A trailing partial segment
    /// is dropped so every matrix has the same shape.
    pub fn extract_segments(&self, signal: &[f32]) -> Result<Vec<Array2<f32>>> {
        let per_segment = self.config.samples_per_segment();
        let complete = (signal.len() / per_segment).min(self.config.num_segments);

        if complete == 0 {
            return Err(ClassifyError::NotEnoughAudio {
                available: signal.len(),
                required: per_segment,
            }
            .into());
        }
        if complete < self.config.num_segments {
            log::warn!(
                "Only {} of {} segments available ({} samples)",
                complete,
                self.config.num_segments,
                signal.len()
            );
        }

        let segments = (0..complete)
            .into_par_iter()
            .map(|d| {
                let start = d * per_segment;
                self.mfcc.compute(&signal[start..start + per_segment])
            })
            .collect::<Result<Vec<_>>>()?;

        log::debug!(
            "Extracted {} segments shaped {:?}",
            segments.len(),
            self.config.segment_shape()
        );
        Ok(segments)
    }
}
