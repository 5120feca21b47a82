//! Maps quiz results to opponent search depth.

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Inclusive range of search depths.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepthBand {
    pub min: u8,
    pub max: u8,
}

impl DepthBand {
    pub const fn new(min: u8, max: u8) -> Self {
        Self { min, max }
    }

    pub fn contains(self, depth: u8) -> bool {
        (self.min..=self.max).contains(&depth)
    }

    fn sample<R: Rng + ?Sized>(self, rng: &mut R) -> u8 {
        rng.gen_range(self.min..=self.max)
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DifficultyError {
    #[error("depth band {min}..={max} is empty")]
    EmptyBand { min: u8, max: u8 },
    #[error("depth band must start at 1 or higher")]
    ZeroDepth,
    #[error("correct band tops out at {correct_max} but incorrect band starts at {incorrect_min}")]
    Overlap { correct_max: u8, incorrect_min: u8 },
    #[error("random move chance {0} is outside [0, 1]")]
    Chance(f64),
}

/// Depth bands for correct and incorrect answers.
///
/// Every depth drawn for a correct answer is strictly shallower than any
/// depth drawn for an incorrect one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DifficultyBands {
    correct: DepthBand,
    incorrect: DepthBand,
}

impl DifficultyBands {
    pub fn new(correct: DepthBand, incorrect: DepthBand) -> Result<Self, DifficultyError> {
        for band in [correct, incorrect] {
            if band.min > band.max {
                return Err(DifficultyError::EmptyBand {
                    min: band.min,
                    max: band.max,
                });
            }
            if band.min == 0 {
                return Err(DifficultyError::ZeroDepth);
            }
        }
        if correct.max >= incorrect.min {
            return Err(DifficultyError::Overlap {
                correct_max: correct.max,
                incorrect_min: incorrect.min,
            });
        }
        Ok(Self { correct, incorrect })
    }

    pub fn correct(&self) -> DepthBand {
        self.correct
    }

    pub fn incorrect(&self) -> DepthBand {
        self.incorrect
    }

    /// Samples a search depth: shallow after a correct answer, deep after an
    /// incorrect one.
    pub fn select_depth<R: Rng + ?Sized>(&self, was_correct: bool, rng: &mut R) -> u8 {
        let band = if was_correct {
            self.correct
        } else {
            self.incorrect
        };
        band.sample(rng)
    }
}

impl Default for DifficultyBands {
    fn default() -> Self {
        Self {
            correct: DepthBand::new(3, 5),
            incorrect: DepthBand::new(16, 18),
        }
    }
}

/// Validates a probability used for the occasional random opponent move.
pub fn validate_chance(chance: f64) -> Result<f64, DifficultyError> {
    if (0.0..=1.0).contains(&chance) {
        Ok(chance)
    } else {
        Err(DifficultyError::Chance(chance))
    }
}
