//! Core data types: the genre dictionary and prediction results

mod genre;
mod prediction;

pub use genre::{Genre, GENRE_COUNT};
pub use prediction::{Prediction, RankedGenre};
