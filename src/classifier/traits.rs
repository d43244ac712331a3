//! Model trait and segment aggregation

use crate::model::Prediction;
use anyhow::Result;
use ndarray::Array2;

/// Genre model trait - allows swapping the network for fixed test models
pub trait GenreModel {
    /// Class probabilities for one feature matrix (frames, coefficients)
    fn predict(&self, features: &Array2<f32>) -> Result<Vec<f32>>;

    /// Class probabilities for several segments, in order
    fn predict_batch(&self, segments: &[Array2<f32>]) -> Result<Vec<Vec<f32>>> {
        segments.iter().map(|s| self.predict(s)).collect()
    }
}

/// How per-segment outputs become one prediction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SegmentStrategy {
    /// Classify only the first segment
    First,
    /// Average the probability vectors of all segments
    #[default]
    Mean,
}

/// Run the model over the segments and combine the results
pub fn classify<M: GenreModel + ?Sized>(
    model: &M,
    segments: &[Array2<f32>],
    strategy: SegmentStrategy,
) -> Result<Prediction> {
    let used = match strategy {
        SegmentStrategy::First => &segments[..segments.len().min(1)],
        SegmentStrategy::Mean => segments,
    };
    anyhow::ensure!(!used.is_empty(), "No feature segments to classify");

    let outputs = model.predict_batch(used)?;
    log::debug!("Model produced {} output vector(s)", outputs.len());

    let probabilities = mean_probabilities(&outputs);
    Ok(Prediction::from_probabilities(probabilities)?)
}

fn mean_probabilities(outputs: &[Vec<f32>]) -> Vec<f32> {
    let width = outputs.iter().map(Vec::len).max().unwrap_or(0);
    let mut sum = vec![0.0f32; width];
    for output in outputs {
        for (acc, &p) in sum.iter_mut().zip(output) {
            *acc += p;
        }
    }
    let n = outputs.len().max(1) as f32;
    sum.into_iter().map(|s| s / n).collect()
}
