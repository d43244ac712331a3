use anyhow::Result;
use candle::{DType, Device};
use candle_nn::{VarBuilder, VarMap};
use genre_classifier::audio::{probe_duration, trim_to_window};
use genre_classifier::classifier::{GenreCnn, GenreModel, SegmentStrategy};
use genre_classifier::features::FeatureConfig;
use genre_classifier::model::Genre;
use genre_classifier::{ClassifyConfig, ClassifyError, ClassifyPipeline};
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use ndarray::Array2;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tempfile::TempDir;

/// Model returning the same probabilities for every segment
struct FixedModel(Vec<f32>);

impl GenreModel for FixedModel {
    fn predict(&self, _features: &Array2<f32>) -> Result<Vec<f32>> {
        Ok(self.0.clone())
    }
}

fn fixed_model() -> FixedModel {
    FixedModel(vec![
        0.05, 0.82, 0.02, 0.01, 0.03, 0.02, 0.01, 0.02, 0.01, 0.01,
    ])
}

/// Write a 16-bit sine sweep WAV
fn write_wav(path: &Path, secs: f32, sample_rate: u32, channels: u16) {
    let spec = WavSpec {
        channels,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("Failed to create WAV");
    let frames = (secs * sample_rate as f32) as usize;
    for i in 0..frames {
        let t = i as f32 / sample_rate as f32;
        let freq = 220.0 + 20.0 * t;
        let value = (2.0 * std::f32::consts::PI * freq * t).sin() * 0.5;
        for _ in 0..channels {
            writer
                .write_sample((value * i16::MAX as f32) as i16)
                .expect("Failed to write sample");
        }
    }
    writer.finalize().expect("Failed to finalize WAV");
}

fn wav_duration_ms(path: &Path) -> u64 {
    let reader = WavReader::open(path).unwrap();
    reader.duration() as u64 * 1000 / reader.spec().sample_rate as u64
}

#[test]
fn test_short_input_rejected_before_trimming() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("short.wav");
    let output = dir.path().join("prediction.txt");
    write_wav(&input, 10.0, 22_050, 1);
    let original = fs::read(&input).unwrap();

    let config = ClassifyConfig::new(input.clone(), output.clone());
    let pipeline = ClassifyPipeline::new(config, fixed_model()).unwrap();
    let err = pipeline.run().unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ClassifyError>(),
        Some(ClassifyError::TooShort { .. })
    ));
    assert_eq!(fs::read(&input).unwrap(), original, "input must be untouched");
    assert!(!output.exists());
}

#[test]
fn test_trim_keeps_exactly_thirty_seconds() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("long.wav");
    write_wav(&input, 45.0, 44_100, 2);

    let window = trim_to_window(&input, Duration::from_secs(30)).unwrap();
    assert_eq!(window.start_ms, 7_500);
    assert_eq!(window.end_ms, 37_500);

    let reader = WavReader::open(&input).unwrap();
    assert_eq!(reader.spec().channels, 2);
    assert_eq!(reader.spec().bits_per_sample, 16);
    assert_eq!(reader.duration(), 1_323_000);
    drop(reader);
    assert_eq!(wav_duration_ms(&input), 30_000);
}

#[test]
fn test_trim_preserves_float_samples() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("float.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: 8_000,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&input, spec).unwrap();
    for i in 0..(8_000 * 40) {
        writer.write_sample(i as f32 / 1e6).unwrap();
    }
    writer.finalize().unwrap();

    trim_to_window(&input, Duration::from_secs(30)).unwrap();

    let mut reader = WavReader::open(&input).unwrap();
    assert_eq!(reader.spec().sample_format, SampleFormat::Float);
    assert_eq!(reader.duration(), 240_000);
    // Window starts at 5s
    let first: f32 = reader.samples::<f32>().next().unwrap().unwrap();
    assert_eq!(first, 40_000.0 / 1e6);
}

#[test]
fn test_trim_clamps_short_file() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("clip.wav");
    write_wav(&input, 20.0, 8_000, 1);

    let window = trim_to_window(&input, Duration::from_secs(30)).unwrap();
    assert_eq!((window.start_ms, window.end_ms), (0, 20_000));
    assert_eq!(wav_duration_ms(&input), 20_000);
}

#[test]
fn test_probe_duration_of_wav() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("probe.wav");
    write_wav(&input, 12.0, 22_050, 1);

    let duration = probe_duration(&input).unwrap();
    assert!((duration.as_secs_f64() - 12.0).abs() < 0.05);
}

#[test]
fn test_pipeline_writes_top_three() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("track.wav");
    let output = dir.path().join("out").join("prediction.txt");
    let json = dir.path().join("out").join("prediction.json");
    write_wav(&input, 40.0, 22_050, 1);

    let config = ClassifyConfig::new(input.clone(), output.clone()).with_json_output(json.clone());
    let pipeline = ClassifyPipeline::new(config, fixed_model()).unwrap();
    let report = pipeline.run().unwrap();

    assert_eq!(report.predicted, Genre::Classical);
    assert_eq!(
        fs::read_to_string(&output).unwrap(),
        "classical: 0.82\nblues: 0.05\nhiphop: 0.03\n"
    );
    assert!(json.exists());
    assert_eq!(wav_duration_ms(&input), 30_000);
}

#[test]
fn test_pipeline_is_deterministic() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("source.wav");
    write_wav(&source, 40.0, 22_050, 2);

    // Both runs read their weights from the same VarMap
    let varmap = VarMap::new();
    let features = FeatureConfig::default();

    let mut outputs = Vec::new();
    for run in 0..2 {
        let input = dir.path().join(format!("run{}.wav", run));
        fs::copy(&source, &input).unwrap();
        let output = dir.path().join(format!("run{}.txt", run));

        let vb = VarBuilder::from_varmap(&varmap, DType::F32, &Device::Cpu);
        let model = GenreCnn::new(vb, features.segment_shape()).unwrap();
        let config = ClassifyConfig::new(input, output.clone()).with_features(features);
        ClassifyPipeline::new(config, model).unwrap().run().unwrap();

        outputs.push(fs::read_to_string(&output).unwrap());
    }

    assert_eq!(outputs[0], outputs[1]);
    assert_eq!(outputs[0].lines().count(), 3);
}

#[test]
fn test_first_segment_strategy() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("first.wav");
    let output = dir.path().join("first.txt");
    write_wav(&input, 31.0, 22_050, 1);

    let config = ClassifyConfig::new(input, output.clone())
        .with_strategy(SegmentStrategy::First)
        .with_top_n(1);
    let pipeline = ClassifyPipeline::new(config, fixed_model()).unwrap();
    pipeline.run().unwrap();

    assert_eq!(fs::read_to_string(&output).unwrap(), "classical: 0.82\n");
}

#[test]
fn test_failed_conversion_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("track.mp3");
    fs::write(&input, b"not really audio").unwrap();
    let output = dir.path().join("prediction.txt");

    let config = ClassifyConfig::new(input, output.clone()).with_converter("/nonexistent/ffmpeg");
    let pipeline = ClassifyPipeline::new(config, fixed_model()).unwrap();

    assert!(pipeline.run().is_err());
    assert!(!output.exists());
}

/// Write a converter that ignores its input and copies `fixture` to its last argument
#[cfg(unix)]
fn write_stub_converter(dir: &Path, fixture: &Path) -> std::path::PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let script = dir.join("fake-ffmpeg");
    fs::write(
        &script,
        format!(
            "#!/bin/sh\nfor last in \"$@\"; do :; done\ncp '{}' \"$last\"\n",
            fixture.display()
        ),
    )
    .unwrap();
    fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
    script
}

#[cfg(unix)]
#[test]
fn test_converted_sibling_is_classified() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.wav");
    write_wav(&fixture, 40.0, 22_050, 2);
    let converter = write_stub_converter(dir.path(), &fixture);

    let input = dir.path().join("track.mp3");
    fs::write(&input, b"compressed bytes").unwrap();
    let output = dir.path().join("prediction.txt");

    let config = ClassifyConfig::new(input.clone(), output.clone())
        .with_converter(converter.to_string_lossy());
    let report = ClassifyPipeline::new(config, fixed_model())
        .unwrap()
        .run()
        .unwrap();

    let sibling = dir.path().join("track.wav");
    assert_eq!(report.predicted, Genre::Classical);
    assert_eq!(wav_duration_ms(&sibling), 30_000);
    assert_eq!(fs::read(&input).unwrap(), b"compressed bytes");
    assert_eq!(wav_duration_ms(&fixture), 40_000);
    assert!(output.exists());
}

#[cfg(unix)]
#[test]
fn test_short_converted_input_leaves_no_sibling() {
    let dir = TempDir::new().unwrap();
    let fixture = dir.path().join("fixture.wav");
    write_wav(&fixture, 10.0, 22_050, 1);
    let converter = write_stub_converter(dir.path(), &fixture);

    let input = dir.path().join("short.ogg");
    fs::write(&input, b"compressed bytes").unwrap();
    let output = dir.path().join("prediction.txt");

    let config = ClassifyConfig::new(input.clone(), output.clone())
        .with_converter(converter.to_string_lossy());
    let err = ClassifyPipeline::new(config, fixed_model())
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ClassifyError>(),
        Some(ClassifyError::TooShort { .. })
    ));
    assert!(!dir.path().join("short.wav").exists());
    assert!(input.exists());
    assert!(!output.exists());
}

#[cfg(unix)]
#[test]
fn test_converter_exit_status_is_fatal() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("track.flac");
    fs::write(&input, b"compressed bytes").unwrap();
    let output = dir.path().join("prediction.txt");

    let config = ClassifyConfig::new(input, output.clone()).with_converter("false");
    let err = ClassifyPipeline::new(config, fixed_model())
        .unwrap()
        .run()
        .unwrap_err();

    assert!(matches!(
        err.downcast_ref::<ClassifyError>(),
        Some(ClassifyError::ConversionFailed { .. })
    ));
    assert!(!output.exists());
}
