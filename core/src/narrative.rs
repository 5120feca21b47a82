//! Opponent lines shown alongside the board.

use serde::{Deserialize, Serialize};

use crate::termination::{Outcome, OutcomeKind};
use crate::types::Color;

/// Text for every situation the opponent comments on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Narratives {
    pub opening: String,
    /// Said after the opponent skips its search and plays a random move.
    pub random_move: String,
    pub player_checkmated_opponent: String,
    pub opponent_checkmated_player: String,
    pub draw: String,
    pub stalemate: String,
    pub insufficient_material: String,
    pub repetition: String,
}

impl Narratives {
    /// Line for a finished game, from the human's point of view.
    pub fn outcome(&self, outcome: Outcome, human: Color) -> &str {
        match outcome.kind {
            OutcomeKind::Checkmate if outcome.winner == Some(human) => {
                &self.player_checkmated_opponent
            }
            OutcomeKind::Checkmate => &self.opponent_checkmated_player,
            OutcomeKind::Draw => &self.draw,
            OutcomeKind::Stalemate => &self.stalemate,
            OutcomeKind::InsufficientMaterial => &self.insufficient_material,
            OutcomeKind::ThreefoldRepetition => &self.repetition,
        }
    }
}

impl Default for Narratives {
    fn default() -> Self {
        Self {
            opening: "Before I make my first move, let's see how much you know...".to_string(),
            random_move: "Your move!".to_string(),
            player_checkmated_opponent:
                "What?! This is preposterous! I demand a rematch.".to_string(),
            opponent_checkmated_player: "Checkmate. How delightfully pathetic.".to_string(),
            draw: "A draw? How dreadfully bourgeois.".to_string(),
            stalemate: "Stalemate? How pedestrian.".to_string(),
            insufficient_material: "Neither of us can win with what's left. How tedious."
                .to_string(),
            repetition: "Repeating ourselves, are we? A draw, then.".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checkmate_lines_follow_winner() {
        let narratives = Narratives::default();
        let white_wins = Outcome {
            kind: OutcomeKind::Checkmate,
            winner: Some(Color::White),
        };
        assert_eq!(
            narratives.outcome(white_wins, Color::White),
            narratives.player_checkmated_opponent
        );
        assert_eq!(
            narratives.outcome(white_wins, Color::Black),
            narratives.opponent_checkmated_player
        );
    }

    #[test]
    fn test_draw_lines_are_distinct() {
        let narratives = Narratives::default();
        let lines: Vec<&str> = [
            OutcomeKind::Draw,
            OutcomeKind::Stalemate,
            OutcomeKind::InsufficientMaterial,
            OutcomeKind::ThreefoldRepetition,
        ]
        .into_iter()
        .map(|kind| narratives.outcome(Outcome::draw(kind), Color::White))
        .collect();
        for (i, a) in lines.iter().enumerate() {
            for b in &lines[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
