//! Audio decoding to mono f32 PCM using symphonia

use anyhow::{Context, Result};
use std::io::ErrorKind;
use std::path::Path;
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

/// Decoded mono audio
#[derive(Debug, Clone)]
pub struct DecodedAudio {
    /// Mono samples in [-1.0, 1.0]
    pub samples: Vec<f32>,
    /// Sample rate in Hz
    pub sample_rate: u32,
}

impl DecodedAudio {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Open a file with symphonia's default probe
pub(crate) fn open_format(path: &Path) -> Result<Box<dyn FormatReader>> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open audio file: {:?}", path))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension() {
        hint.with_extension(ext.to_str().unwrap_or(""));
    }

    let probed = symphonia::default::get_probe()
        .format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )
        .with_context(|| format!("Failed to probe audio format: {:?}", path))?;

    Ok(probed.format)
}

/// Average interleaved frames down to one channel
fn downmix(interleaved: &[f32], channels: usize) -> impl Iterator<Item = f32> + '_ {
    let channels = channels.max(1);
    interleaved
        .chunks_exact(channels)
        .map(move |frame| frame.iter().sum::<f32>() / channels as f32)
}

/// Mono chunks of one track, one per decoded packet
struct MonoPackets {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    buffer: Option<SampleBuffer<f32>>,
}

impl MonoPackets {
    fn open(path: &Path) -> Result<(Self, u32)> {
        let format = open_format(path)?;
        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .context("No audio track found")?;

        let track_id = track.id;
        let sample_rate = track
            .codec_params
            .sample_rate
            .context("No sample rate in audio track")?;
        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())
            .context("Failed to create audio decoder")?;

        let packets = Self {
            format,
            decoder,
            track_id,
            buffer: None,
        };
        Ok((packets, sample_rate))
    }
}

impl Iterator for MonoPackets {
    type Item = Vec<f32>;

    fn next(&mut self) -> Option<Vec<f32>> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(e)) if e.kind() == ErrorKind::UnexpectedEof => {
                    return None
                }
                Err(e) => {
                    log::warn!("Stopped reading packets: {:?}", e);
                    return None;
                }
            };
            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(decoded) => decoded,
                Err(e) => {
                    log::warn!("Skipping undecodable packet: {:?}", e);
                    continue;
                }
            };

            let spec = *decoded.spec();
            let frames = decoded.capacity();
            // Reuse the buffer until a packet outgrows it
            let needed = frames * spec.channels.count();
            let buffer = match self.buffer.take() {
                Some(buffer) if buffer.capacity() >= needed => buffer,
                _ => SampleBuffer::<f32>::new(frames as u64, spec),
            };
            let buffer = self.buffer.insert(buffer);
            buffer.copy_interleaved_ref(decoded);

            return Some(downmix(buffer.samples(), spec.channels.count()).collect());
        }
    }
}

/// Decode the whole file to mono, averaging channels
pub fn decode_to_mono(path: &Path) -> Result<DecodedAudio> {
    log::debug!("Decoding {:?}", path);

    let (packets, sample_rate) = MonoPackets::open(path)?;
    let samples: Vec<f32> = packets.flatten().collect();

    let audio = DecodedAudio {
        samples,
        sample_rate,
    };
    log::debug!(
        "Decoded {} mono samples ({:.1}s) at {}Hz",
        audio.samples.len(),
        audio.duration_secs(),
        sample_rate
    );
    Ok(audio)
}
