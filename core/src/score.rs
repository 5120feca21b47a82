//! Final score from quiz performance and game length.

pub const BASE_SCORE: u32 = 100;
pub const CORRECT_BONUS: u32 = 10;
pub const INCORRECT_PENALTY: u32 = 5;
pub const MOVE_PENALTY: u32 = 1;
pub const RESHUFFLE_PENALTY: u32 = 25;

/// Full moves made by the human: half-moves rounded up to pairs.
pub const fn player_full_moves(half_moves: u32) -> u32 {
    half_moves.div_ceil(2)
}

/// Every term that goes into a score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoreBreakdown {
    pub base: u32,
    pub quiz_bonus: u32,
    pub quiz_penalty: u32,
    pub move_penalty: u32,
    pub reshuffle_penalty: u32,
}

impl ScoreBreakdown {
    pub fn new(correct: u32, incorrect: u32, player_full_moves: u32, reshuffles: u32) -> Self {
        Self {
            base: BASE_SCORE,
            quiz_bonus: correct.saturating_mul(CORRECT_BONUS),
            quiz_penalty: incorrect.saturating_mul(INCORRECT_PENALTY),
            move_penalty: player_full_moves.saturating_mul(MOVE_PENALTY),
            reshuffle_penalty: reshuffles.saturating_mul(RESHUFFLE_PENALTY),
        }
    }

    /// Bonus minus penalties, floored at zero.
    pub fn total(&self) -> u32 {
        self.base
            .saturating_add(self.quiz_bonus)
            .saturating_sub(self.quiz_penalty)
            .saturating_sub(self.move_penalty)
            .saturating_sub(self.reshuffle_penalty)
    }
}

/// Computes `max(0, 100 + 10c - 5i - m - 25r)`.
pub fn score(correct: u32, incorrect: u32, player_full_moves: u32, reshuffles: u32) -> u32 {
    let breakdown = ScoreBreakdown::new(correct, incorrect, player_full_moves, reshuffles);
    let total = breakdown.total();
    tracing::debug!(
        base = breakdown.base,
        quiz_bonus = breakdown.quiz_bonus,
        quiz_penalty = breakdown.quiz_penalty,
        move_penalty = breakdown.move_penalty,
        reshuffle_penalty = breakdown.reshuffle_penalty,
        total,
        "score computed"
    );
    total
}
