//! Format normalisation through an external converter (ffmpeg)

use crate::error::ClassifyError;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Extension of the uncompressed format the rest of the pipeline expects
pub const CANONICAL_EXTENSION: &str = "wav";

/// Whether the path already carries the canonical extension (case-insensitive)
pub fn is_canonical(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(CANONICAL_EXTENSION))
        .unwrap_or(false)
}

/// Ensure the audio file is a WAV file, converting it if needed
///
/// WAV input is returned unchanged without spawning anything. Other formats
/// are transcoded by `converter` into a sibling file with the same stem and
/// a `.wav` extension, which is returned.
pub fn normalize_format(path: &Path, converter: &str) -> Result<PathBuf> {
    if is_canonical(path) {
        log::debug!("Already {}: {:?}", CANONICAL_EXTENSION, path);
        return Ok(path.to_path_buf());
    }

    let target = path.with_extension(CANONICAL_EXTENSION);
    log::info!("Converting {:?} -> {:?} with {}", path, target, converter);

    let output = Command::new(converter)
        .arg("-nostdin")
        .arg("-y")
        .args(["-loglevel", "error"])
        .arg("-i")
        .arg(path)
        .arg(&target)
        .stdin(Stdio::null())
        .output()
        .with_context(|| format!("Failed to run audio converter `{}`", converter))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            log::warn!("{} stderr: {}", converter, stderr.trim());
        }
        return Err(ClassifyError::ConversionFailed {
            program: converter.to_string(),
            input: path.to_path_buf(),
            status: output.status.to_string(),
        }
        .into());
    }

    Ok(target)
}
