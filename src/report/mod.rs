//! Prediction reporting: console output, text file and JSON file

use crate::model::{Genre, Prediction, RankedGenre};
use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Probability above which a class is flagged in the mask line
pub const CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Everything printed and persisted for one run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Report {
    pub predicted: Genre,
    pub probabilities: Vec<f32>,
    pub above_threshold: Vec<bool>,
    pub top: Vec<RankedGenre>,
}

impl Report {
    pub fn new(prediction: &Prediction, top_n: usize) -> Self {
        Self {
            predicted: prediction.genre(),
            probabilities: prediction.probabilities.clone(),
            above_threshold: prediction.threshold_mask(CONFIDENCE_THRESHOLD),
            top: prediction.top(top_n),
        }
    }

    /// Probabilities as `[0.050 0.820 ...]`
    pub fn probabilities_line(&self) -> String {
        let values: Vec<String> = self
            .probabilities
            .iter()
            .map(|p| format!("{:.3}", p))
            .collect();
        format!("[{}]", values.join(" "))
    }

    /// Threshold mask as `[false true ...]`
    pub fn mask_line(&self) -> String {
        let values: Vec<&str> = self
            .above_threshold
            .iter()
            .map(|&m| if m { "true" } else { "false" })
            .collect();
        format!("[{}]", values.join(" "))
    }

    /// Ranked genres, one `name: 0.82` line each
    pub fn top_lines(&self) -> String {
        self.top.iter().map(|ranked| format!("{}\n", ranked)).collect()
    }

    /// Print the prediction and diagnostics to stdout
    pub fn print(&self) {
        println!("Predicted Genre: {}", self.predicted);
        println!("{}", self.mask_line());
        println!("{}", self.probabilities_line());
        print!("{}", self.top_lines());
    }

    /// Write the ranked genres to `path`, replacing any previous content
    pub fn write_text(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        fs::write(path, self.top_lines())
            .with_context(|| format!("Failed to write report: {:?}", path))?;
        log::info!("Report written to {:?}", path);
        Ok(())
    }

    /// Write the full report as JSON
    pub fn write_json(&self, path: &Path) -> Result<()> {
        ensure_parent(path)?;
        let json = serde_json::to_string_pretty(self).context("Failed to serialize report")?;
        fs::write(path, json).with_context(|| format!("Failed to write JSON report: {:?}", path))?;
        log::info!("JSON report written to {:?}", path);
        Ok(())
    }
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }
    Ok(())
}
