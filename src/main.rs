use anyhow::Result;
use clap::{Parser, ValueEnum};
use genre_classifier::classifier::{GenreCnn, SegmentStrategy};
use genre_classifier::{ClassifyConfig, ClassifyPipeline};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "genre-classifier")]
#[command(about = "Predict the genre of a music file", long_about = None)]
struct Args {
    /// Audio file to classify (converted to WAV if needed, then trimmed in place)
    input: String,

    /// Path to the model weights (safetensors)
    #[arg(short = 'm', long, default_value = "models/genre_cnn.safetensors")]
    model: String,

    /// Text file receiving the top genres (overwritten)
    #[arg(short = 'o', long, default_value = "genre_prediction.txt")]
    output: String,

    /// Also write the full report as JSON
    #[arg(long)]
    json: Option<String>,

    /// Minimum accepted duration in seconds
    #[arg(long, default_value = "30")]
    min_duration: f64,

    /// Length of the analysed window in seconds
    #[arg(long, default_value = "30")]
    window: u64,

    /// Number of genres to report
    #[arg(long, default_value = "3")]
    top: usize,

    /// How segment predictions are combined
    #[arg(long, value_enum, default_value_t = Segments::Mean)]
    segments: Segments,

    /// Converter used for non-WAV input
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg: String,

    /// Verbose logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Segments {
    /// Classify the first segment only
    First,
    /// Average all segments
    Mean,
}

impl From<Segments> for SegmentStrategy {
    fn from(value: Segments) -> Self {
        match value {
            Segments::First => SegmentStrategy::First,
            Segments::Mean => SegmentStrategy::Mean,
        }
    }
}

fn expand(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).as_ref())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    anyhow::ensure!(
        args.min_duration.is_finite() && args.min_duration >= 0.0,
        "--min-duration must be a non-negative number of seconds"
    );

    let mut config = ClassifyConfig::new(expand(&args.input), expand(&args.output))
        .with_min_duration(Duration::from_secs_f64(args.min_duration))
        .with_window(Duration::from_secs(args.window))
        .with_top_n(args.top)
        .with_converter(args.ffmpeg.as_str())
        .with_strategy(args.segments.into());

    if let Some(ref json) = args.json {
        config = config.with_json_output(expand(json));
    }

    // Load the model before touching the input file
    let model = GenreCnn::load(&expand(&args.model), config.features.segment_shape())?;
    log::debug!("Model input shape: {:?}", model.input_shape());

    let pipeline = ClassifyPipeline::new(config, model)?;
    let report = pipeline.run()?;

    log::info!("Predicted genre: {}", report.predicted);
    Ok(())
}
