//! Classification pipeline orchestration

use super::config::ClassifyConfig;
use crate::audio::{normalize_format, trim_to_window, validate_duration};
use crate::classifier::{classify, GenreModel};
use crate::features::FeatureExtractor;
use crate::report::Report;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Single-file classification pipeline
pub struct ClassifyPipeline<M: GenreModel> {
    config: ClassifyConfig,
    extractor: FeatureExtractor,
    model: M,
}

impl<M: GenreModel> ClassifyPipeline<M> {
    /// Create a new pipeline around a loaded model
    pub fn new(config: ClassifyConfig, model: M) -> Result<Self> {
        let extractor = FeatureExtractor::new(config.features)?;
        Ok(Self {
            config,
            extractor,
            model,
        })
    }

    /// Run every step once, print the result and write the reports
    pub fn run(&self) -> Result<Report> {
        log::info!("Classifying {:?}", self.config.input);

        // Step 1: Make sure we work on a WAV file
        let wav_path = normalize_format(&self.config.input, &self.config.converter)?;

        // Step 2: Reject short input before anything is modified
        let duration = match validate_duration(&wav_path, self.config.min_duration) {
            Ok(duration) => duration,
            Err(e) => {
                if wav_path != self.config.input {
                    discard_converted(&wav_path);
                }
                return Err(e);
            }
        };
        log::info!("Duration: {:.1}s", duration.as_secs_f64());

        // Step 3: Keep only the window around the midpoint
        let window = trim_to_window(&wav_path, self.config.window)
            .with_context(|| format!("Failed to trim {:?}", wav_path))?;
        log::info!("Kept {}ms of audio", window.len_ms());

        // Step 4: Features per segment
        let segments = self
            .extractor
            .extract_file(&wav_path)
            .with_context(|| format!("Failed to extract features from {:?}", wav_path))?;
        log::info!(
            "Extracted {} segment(s), using {:?}",
            segments.len(),
            self.config.strategy
        );

        // Step 5: Classify and report
        let prediction = classify(&self.model, &segments, self.config.strategy)?;
        let report = Report::new(&prediction, self.config.top_n);

        report.print();
        report.write_text(&self.config.output)?;
        if let Some(ref json_path) = self.config.json_output {
            report.write_json(json_path)?;
        }

        Ok(report)
    }
}

/// Remove a WAV produced by the converter for rejected input
fn discard_converted(path: &Path) {
    match fs::remove_file(path) {
        Ok(()) => log::debug!("Removed converted file {:?}", path),
        Err(e) => log::warn!("Failed to remove converted file {:?}: {}", path, e),
    }
}
