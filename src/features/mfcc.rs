//! MFCC computation
//!
//! Follows librosa's default conventions so features line up with models
//! trained on librosa output:
//! - centred frames with zero padding of `n_fft / 2` on both sides
//! - periodic Hann window, power spectrum
//! - Slaney mel scale with Slaney area normalisation
//! - `power_to_db` with ref 1.0, amin 1e-10, top_db 80
//! - orthonormal DCT-II, first `n_mfcc` coefficients

use anyhow::{bail, Result};
use ndarray::Array2;
use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f64::consts::PI;
use std::sync::Arc;

const AMIN: f32 = 1e-10;
const TOP_DB: f32 = 80.0;

/// Parameters for [`MfccExtractor`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MfccConfig {
    pub sample_rate: u32,
    pub n_mfcc: usize,
    pub n_fft: usize,
    pub hop_length: usize,
    pub n_mels: usize,
}

/// Reusable MFCC extractor with precomputed window, filterbank and DCT
pub struct MfccExtractor {
    config: MfccConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    /// (n_mels, n_fft / 2 + 1)
    mel_basis: Array2<f32>,
    /// (n_mfcc, n_mels)
    dct_basis: Array2<f32>,
}

impl MfccExtractor {
    pub fn new(config: MfccConfig) -> Result<Self> {
        if config.n_fft == 0 || config.hop_length == 0 || config.n_mels == 0 {
            bail!("n_fft, hop_length and n_mels must be non-zero");
        }
        if config.n_mfcc == 0 || config.n_mfcc > config.n_mels {
            bail!(
                "n_mfcc must be between 1 and n_mels ({}), got {}",
                config.n_mels,
                config.n_mfcc
            );
        }

        let fft = FftPlanner::<f32>::new().plan_fft_forward(config.n_fft);

        Ok(Self {
            fft,
            window: hann_window(config.n_fft),
            mel_basis: mel_filterbank(config.sample_rate, config.n_fft, config.n_mels),
            dct_basis: dct_ortho(config.n_mfcc, config.n_mels),
            config,
        })
    }

    /// Number of frames produced for a signal of `len` samples
    pub fn frame_count(&self, len: usize) -> usize {
        1 + len / self.config.hop_length
    }

    /// Compute MFCCs shaped (frames, n_mfcc)
    pub fn compute(&self, signal: &[f32]) -> Result<Array2<f32>> {
        if signal.is_empty() {
            bail!("Cannot compute MFCC of an empty signal");
        }

        let power = self.power_spectrogram(signal);
        let mel = self.mel_basis.dot(&power);
        let log_mel = power_to_db(mel);
        let mfcc = self.dct_basis.dot(&log_mel);

        Ok(mfcc.reversed_axes().as_standard_layout().into_owned())
    }

    /// Power spectrogram shaped (n_fft / 2 + 1, frames)
    fn power_spectrogram(&self, signal: &[f32]) -> Array2<f32> {
        let n_fft = self.config.n_fft;
        let hop = self.config.hop_length;
        let pad = n_fft / 2;
        let n_bins = n_fft / 2 + 1;
        let n_frames = self.frame_count(signal.len());

        let mut padded = vec![0.0f32; signal.len() + 2 * pad];
        padded[pad..pad + signal.len()].copy_from_slice(signal);

        let mut spectrogram = Array2::<f32>::zeros((n_bins, n_frames));
        let mut buffer = vec![Complex::new(0.0f32, 0.0); n_fft];

        for frame in 0..n_frames {
            let start = frame * hop;
            for (i, slot) in buffer.iter_mut().enumerate() {
                let sample = padded.get(start + i).copied().unwrap_or(0.0);
                *slot = Complex::new(sample * self.window[i], 0.0);
            }
            self.fft.process(&mut buffer);
            for (bin, value) in buffer.iter().take(n_bins).enumerate() {
                spectrogram[[bin, frame]] = value.norm_sqr();
            }
        }

        spectrogram
    }
}

/// Periodic Hann window (scipy `get_window("hann", n, fftbins=True)`)
fn hann_window(n: usize) -> Vec<f32> {
    (0..n)
        .map(|i| (0.5 - 0.5 * (2.0 * PI * i as f64 / n as f64).cos()) as f32)
        .collect()
}

fn hz_to_mel(hz: f64) -> f64 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = 6.4f64.ln() / 27.0;

    if hz >= min_log_hz {
        min_log_mel + (hz / min_log_hz).ln() / logstep
    } else {
        hz / f_sp
    }
}

fn mel_to_hz(mel: f64) -> f64 {
    let f_sp = 200.0 / 3.0;
    let min_log_hz = 1000.0;
    let min_log_mel = min_log_hz / f_sp;
    let logstep = 6.4f64.ln() / 27.0;

    if mel >= min_log_mel {
        min_log_hz * (logstep * (mel - min_log_mel)).exp()
    } else {
        mel * f_sp
    }
}

/// Slaney-normalised triangular mel filters from 0 Hz to Nyquist
pub(crate) fn mel_filterbank(sample_rate: u32, n_fft: usize, n_mels: usize) -> Array2<f32> {
    let n_bins = n_fft / 2 + 1;
    let nyquist = sample_rate as f64 / 2.0;

    let fft_freqs: Vec<f64> = (0..n_bins)
        .map(|k| k as f64 * sample_rate as f64 / n_fft as f64)
        .collect();

    let max_mel = hz_to_mel(nyquist);
    let mel_freqs: Vec<f64> = (0..n_mels + 2)
        .map(|i| mel_to_hz(max_mel * i as f64 / (n_mels + 1) as f64))
        .collect();

    let mut weights = Array2::<f32>::zeros((n_mels, n_bins));
    for m in 0..n_mels {
        let (left, centre, right) = (mel_freqs[m], mel_freqs[m + 1], mel_freqs[m + 2]);
        let enorm = 2.0 / (right - left);
        for (k, &freq) in fft_freqs.iter().enumerate() {
            let lower = (freq - left) / (centre - left);
            let upper = (right - freq) / (right - centre);
            let w = lower.min(upper).max(0.0);
            weights[[m, k]] = (w * enorm) as f32;
        }
    }

    weights
}

/// Orthonormal DCT-II basis, (n_out, n_in)
pub(crate) fn dct_ortho(n_out: usize, n_in: usize) -> Array2<f32> {
    let n = n_in as f64;
    Array2::from_shape_fn((n_out, n_in), |(k, i)| {
        let scale = if k == 0 { (1.0 / n).sqrt() } else { (2.0 / n).sqrt() };
        (scale * (PI * k as f64 * (2.0 * i as f64 + 1.0) / (2.0 * n)).cos()) as f32
    })
}

/// Convert power to decibels, clipped to `TOP_DB` below the peak
fn power_to_db(power: Array2<f32>) -> Array2<f32> {
    let mut db = power.mapv_into(|p| 10.0 * p.max(AMIN).log10());
    let peak = db.fold(f32::NEG_INFINITY, |acc, &v| acc.max(v));
    let floor = peak - TOP_DB;
    db.mapv_inplace(|v| v.max(floor));
    db
}
