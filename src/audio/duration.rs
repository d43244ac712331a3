//! Duration probing and validation

use super::decode::open_format;
use crate::error::ClassifyError;
use anyhow::{Context, Result};
use lofty::prelude::*;
use lofty::probe::Probe;
use std::path::Path;
use std::time::Duration;
use symphonia::core::codecs::CODEC_TYPE_NULL;

/// Read the duration from container metadata
///
/// Uses lofty's audio properties first. If lofty cannot read the file, or
/// reports zero, the duration is derived from symphonia's codec parameters.
pub fn probe_duration(path: &Path) -> Result<Duration> {
    match Probe::open(path).and_then(|probe| probe.read()) {
        Ok(tagged_file) => {
            let duration = tagged_file.properties().duration();
            if !duration.is_zero() {
                return Ok(duration);
            }
            log::warn!("lofty reported zero duration for {:?}, probing stream", path);
        }
        Err(e) => {
            log::warn!("lofty could not read {:?} ({}), probing stream", path, e);
        }
    }

    probe_stream_duration(path)
}

fn probe_stream_duration(path: &Path) -> Result<Duration> {
    let format = open_format(path)?;
    let track = format
        .tracks()
        .iter()
        .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
        .context("No audio track found")?;

    let params = &track.codec_params;
    let sample_rate = params.sample_rate.context("No sample rate in audio track")?;
    let frames = params
        .n_frames
        .with_context(|| format!("Unknown frame count for {:?}", path))?;

    Ok(Duration::from_secs_f64(frames as f64 / sample_rate as f64))
}

/// Reject audio shorter than `min`
pub fn validate_duration(path: &Path, min: Duration) -> Result<Duration> {
    let duration = probe_duration(path)?;
    log::debug!("Duration of {:?}: {:.2}s", path, duration.as_secs_f64());

    if duration < min {
        return Err(ClassifyError::TooShort {
            path: path.to_path_buf(),
            duration_secs: duration.as_secs_f64(),
            min_secs: min.as_secs_f64(),
        }
        .into());
    }

    Ok(duration)
}
