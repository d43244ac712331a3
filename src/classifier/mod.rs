//! Genre classification layer
//!
//! The network sits behind the [`GenreModel`] trait so the pipeline can be
//! driven by the candle CNN in production and by fixed models in tests.

mod cnn;
mod traits;

pub use cnn::GenreCnn;
pub use traits::{classify, GenreModel, SegmentStrategy};
