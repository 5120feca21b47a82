pub mod difficulty;
pub mod narrative;
pub mod quiz;
pub mod rules;
pub mod score;
pub mod termination;
pub mod types;

pub use difficulty::{validate_chance, DepthBand, DifficultyBands, DifficultyError};
pub use narrative::Narratives;
pub use quiz::{Advance, Catalog, CatalogError, QuizDeck, QuizQuestion};
pub use rules::{MoveRejected, RulesAuthority, RulesError, StandardRules};
pub use score::{player_full_moves, score, ScoreBreakdown};
pub use termination::{evaluate, Outcome, OutcomeKind};
pub use types::*;
