use super::genre::{Genre, GENRE_COUNT};
use crate::error::ClassifyError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Network output for one track
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    /// Index of the most probable class (first one on ties)
    pub index: usize,

    /// Probability per class, indexed like [`Genre::all`]
    pub probabilities: Vec<f32>,
}

/// One entry of the ranked genre list
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankedGenre {
    pub genre: Genre,
    pub probability: f32,
}

impl fmt::Display for RankedGenre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {:.2}", self.genre, self.probability)
    }
}

impl Prediction {
    /// Build a prediction from a probability vector over all genres
    pub fn from_probabilities(probabilities: Vec<f32>) -> Result<Self, ClassifyError> {
        if probabilities.len() != GENRE_COUNT {
            return Err(ClassifyError::ProbabilityCount {
                expected: GENRE_COUNT,
                actual: probabilities.len(),
            });
        }

        let index = probabilities
            .iter()
            .enumerate()
            .fold(0, |best, (i, &p)| if p > probabilities[best] { i } else { best });

        Ok(Self {
            index,
            probabilities,
        })
    }

    /// Most probable genre
    pub fn genre(&self) -> Genre {
        // index < GENRE_COUNT is checked on construction
        Genre::all()[self.index]
    }

    pub fn probability(&self, genre: Genre) -> f32 {
        self.probabilities[genre.index()]
    }

    /// Which classes exceed `threshold`
    pub fn threshold_mask(&self, threshold: f32) -> Vec<bool> {
        self.probabilities.iter().map(|&p| p > threshold).collect()
    }

    /// The `n` most probable genres, highest first
    ///
    /// Equal probabilities keep their class order.
    pub fn top(&self, n: usize) -> Vec<RankedGenre> {
        let mut order: Vec<usize> = (0..self.probabilities.len()).collect();
        order.sort_by(|&a, &b| self.probabilities[b].total_cmp(&self.probabilities[a]));

        order
            .into_iter()
            .take(n)
            .map(|i| RankedGenre {
                genre: Genre::all()[i],
                probability: self.probabilities[i],
            })
            .collect()
    }
}
