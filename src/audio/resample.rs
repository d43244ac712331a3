//! Mono resampling using rubato

use anyhow::{anyhow, Result};
use rubato::{FastFixedIn, PolynomialDegree, Resampler};

/// Resample mono audio from `input_rate` to `output_rate`
///
/// The whole signal is processed as one chunk, then the resampler is
/// flushed so the output can be aligned past its delay. The result holds
/// `round(len * output_rate / input_rate)` samples.
pub fn resample_mono(input: &[f32], input_rate: u32, output_rate: u32) -> Result<Vec<f32>> {
    if input_rate == output_rate {
        log::debug!("Sample rate already at {}Hz, skipping resample", output_rate);
        return Ok(input.to_vec());
    }
    if input.is_empty() {
        return Ok(Vec::new());
    }

    let ratio = output_rate as f64 / input_rate as f64;
    let expected = (input.len() as f64 * ratio).round() as usize;

    log::debug!(
        "Resampling {} samples from {}Hz to {}Hz",
        input.len(),
        input_rate,
        output_rate
    );

    let mut resampler = FastFixedIn::<f32>::new(
        ratio,
        1.0,
        PolynomialDegree::Septic,
        input.len(),
        1,
    )
    .map_err(|e| anyhow!("Failed to create resampler: {}", e))?;

    let delay = resampler.output_delay();

    let wave_in = [input];
    let mut output = resampler
        .process(&wave_in[..], None)
        .map_err(|e| anyhow!("Resampling failed: {}", e))?
        .remove(0);

    // Flush with silence so the tail survives the delay compensation
    while output.len() < expected + delay {
        let tail = resampler
            .process_partial::<&[f32]>(None, None)
            .map_err(|e| anyhow!("Resampling flush failed: {}", e))?
            .remove(0);
        if tail.is_empty() {
            break;
        }
        output.extend(tail);
    }

    let aligned: Vec<f32> = output.into_iter().skip(delay).take(expected).collect();
    log::debug!("Resampled to {} samples", aligned.len());
    Ok(aligned)
}
