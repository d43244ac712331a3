//! In-place trimming of a WAV file to a window centred on its midpoint

use crate::error::ClassifyError;
use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use std::path::Path;
use std::time::Duration;

/// Portion of the original file that was kept, in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrimmedWindow {
    pub start_ms: u64,
    pub end_ms: u64,
}

impl TrimmedWindow {
    /// Compute the window around the midpoint of a file lasting `duration_ms`
    ///
    /// Bounds are clamped to `[0, duration_ms]`.
    pub fn centred(duration_ms: f64, window: Duration) -> Self {
        let half = window.as_millis() as u64 / 2;
        let midpoint = (duration_ms / 2.0) as u64;
        let start_ms = midpoint.saturating_sub(half);
        let end_ms = (midpoint + half).min(duration_ms as u64);
        Self { start_ms, end_ms }
    }

    pub fn len_ms(&self) -> u64 {
        self.end_ms - self.start_ms
    }
}

#[derive(Debug, PartialEq, Eq)]
enum SampleKind {
    Int,
    Float,
}

/// Sample layouts that can be rewritten without conversion
fn sample_kind(spec: &WavSpec) -> std::result::Result<SampleKind, ClassifyError> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, 32) => Ok(SampleKind::Float),
        (SampleFormat::Int, 8 | 16 | 24 | 32) => Ok(SampleKind::Int),
        (format, bits) => Err(ClassifyError::UnsupportedFormat(format!(
            "{:?} {}-bit",
            format, bits
        ))),
    }
}

enum Samples {
    Int(Vec<i32>),
    Float(Vec<f32>),
}

/// Trim the WAV at `path` to `window` around its midpoint, overwriting it
///
/// The sample format, rate and channel layout are preserved. No backup of
/// the original audio is kept.
pub fn trim_to_window(path: &Path, window: Duration) -> Result<TrimmedWindow> {
    let mut reader =
        WavReader::open(path).with_context(|| format!("Failed to open WAV file: {:?}", path))?;
    let spec = reader.spec();
    let total_frames = reader.duration() as u64;
    let duration_ms = total_frames as f64 * 1000.0 / spec.sample_rate as f64;

    let trimmed = TrimmedWindow::centred(duration_ms, window);
    let start_frame = ms_to_frame(trimmed.start_ms, spec.sample_rate).min(total_frames);
    let end_frame = ms_to_frame(trimmed.end_ms, spec.sample_rate).min(total_frames);

    log::info!(
        "Trimming {:?}: {:.0}ms -> [{}ms, {}ms]",
        path,
        duration_ms,
        trimmed.start_ms,
        trimmed.end_ms
    );

    let samples = match sample_kind(&spec)? {
        SampleKind::Float => Samples::Float(
            reader
                .samples::<f32>()
                .collect::<std::result::Result<Vec<f32>, _>>()
                .context("Failed to read WAV samples")?,
        ),
        SampleKind::Int => Samples::Int(
            reader
                .samples::<i32>()
                .collect::<std::result::Result<Vec<i32>, _>>()
                .context("Failed to read WAV samples")?,
        ),
    };
    drop(reader);

    let channels = spec.channels as usize;
    let range = start_frame as usize * channels..end_frame as usize * channels;

    match samples {
        Samples::Int(all) => write_samples(path, spec, &all[range])?,
        Samples::Float(all) => write_samples(path, spec, &all[range])?,
    }

    Ok(trimmed)
}

fn ms_to_frame(ms: u64, sample_rate: u32) -> u64 {
    ms * sample_rate as u64 / 1000
}

fn write_samples<S: hound::Sample + Copy>(
    path: &Path,
    spec: WavSpec,
    samples: &[S],
) -> Result<()> {
    let mut writer = WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {:?}", path))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("Failed to finalize WAV file: {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const WINDOW: Duration = Duration::from_secs(30);

    #[test]
    fn test_window_centred_on_midpoint() {
        let window = TrimmedWindow::centred(120_000.0, WINDOW);
        assert_eq!(window.start_ms, 45_000);
        assert_eq!(window.end_ms, 75_000);
        assert_eq!(window.len_ms(), 30_000);
    }

    #[test]
    fn test_window_odd_duration() {
        let window = TrimmedWindow::centred(30_001.5, WINDOW);
        assert_eq!(window.start_ms, 0);
        assert_eq!(window.end_ms, 30_000);
    }

    #[test]
    fn test_window_clamped_to_short_file() {
        let window = TrimmedWindow::centred(20_000.0, WINDOW);
        assert_eq!(window.start_ms, 0);
        assert_eq!(window.end_ms, 20_000);
    }

    fn spec(sample_format: SampleFormat, bits_per_sample: u16) -> WavSpec {
        WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample,
            sample_format,
        }
    }

    #[test]
    fn test_sample_kind() {
        assert_eq!(sample_kind(&spec(SampleFormat::Int, 16)).unwrap(), SampleKind::Int);
        assert_eq!(sample_kind(&spec(SampleFormat::Int, 24)).unwrap(), SampleKind::Int);
        assert_eq!(
            sample_kind(&spec(SampleFormat::Float, 32)).unwrap(),
            SampleKind::Float
        );
    }

    #[test]
    fn test_unsupported_sample_layouts() {
        for (format, bits) in [(SampleFormat::Float, 64), (SampleFormat::Int, 12)] {
            match sample_kind(&spec(format, bits)) {
                Err(ClassifyError::UnsupportedFormat(desc)) => {
                    assert!(desc.contains(&format!("{}-bit", bits)));
                }
                other => panic!("expected UnsupportedFormat, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_ms_to_frame() {
        assert_eq!(ms_to_frame(30_000, 44_100), 1_323_000);
        assert_eq!(ms_to_frame(1, 22_050), 22);
    }
}
