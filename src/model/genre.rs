use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of classes the network predicts
pub const GENRE_COUNT: usize = 10;

/// Music genre, in the class order of the pre-trained network (GTZAN)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Blues,
    Classical,
    Country,
    Disco,
    HipHop,
    Jazz,
    Metal,
    Pop,
    Reggae,
    Rock,
}

impl Genre {
    /// All genres, indexed by class index
    pub fn all() -> &'static [Genre; GENRE_COUNT] {
        &[
            Genre::Blues,
            Genre::Classical,
            Genre::Country,
            Genre::Disco,
            Genre::HipHop,
            Genre::Jazz,
            Genre::Metal,
            Genre::Pop,
            Genre::Reggae,
            Genre::Rock,
        ]
    }

    /// Genre for a class index, `None` past the last class
    pub fn from_index(index: usize) -> Option<Self> {
        Self::all().get(index).copied()
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    /// Label as written in reports
    pub fn name(&self) -> &'static str {
        match self {
            Genre::Blues => "blues",
            Genre::Classical => "classical",
            Genre::Country => "country",
            Genre::Disco => "disco",
            Genre::HipHop => "hiphop",
            Genre::Jazz => "jazz",
            Genre::Metal => "metal",
            Genre::Pop => "pop",
            Genre::Reggae => "reggae",
            Genre::Rock => "rock",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
