//! The rules authority: move legality, move application and terminal
//! predicates.
//!
//! The session only talks to the [`RulesAuthority`] trait. [`StandardRules`]
//! is the standard-chess implementation backed by `shakmaty`.

use std::collections::HashMap;

use shakmaty::fen::Fen;
use shakmaty::{CastlingMode, Chess, EnPassantMode, Position};

use crate::types::{Color, Move, Promotion, Square};

/// Half-moves without a capture or pawn move before the fifty-move rule
/// applies.
pub const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Occurrences of one position that make a threefold repetition.
pub const REPETITION_LIMIT: u32 = 3;

/// A move attempt that the rules do not allow in the current position.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("illegal move {from}{to}")]
pub struct MoveRejected {
    pub from: Square,
    pub to: Square,
}

#[derive(Debug, thiserror::Error)]
pub enum RulesError {
    #[error("invalid FEN {fen:?}: {reason}")]
    InvalidFen { fen: String, reason: String },
}

/// Everything the session needs from a chess rules implementation.
pub trait RulesAuthority {
    /// Validates and applies a move. The promotion hint only matters when the
    /// from/to pair is a pawn promotion.
    fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<Move, MoveRejected>;

    fn is_checkmate(&self) -> bool;

    /// Draw by rule (fifty-move rule). Stalemate, insufficient material and
    /// repetition have their own predicates.
    fn is_draw(&self) -> bool;

    fn is_stalemate(&self) -> bool;

    fn is_insufficient_material(&self) -> bool;

    fn is_threefold_repetition(&self) -> bool;

    /// The side to move.
    fn turn(&self) -> Color;

    /// Forsyth-Edwards notation of the current position.
    fn fen(&self) -> String;

    fn legal_moves(&self) -> Vec<Move>;

    /// Number of half-moves applied since the session started.
    fn history_len(&self) -> usize;
}

/// Standard chess rules.
#[derive(Clone, Debug)]
pub struct StandardRules {
    position: Chess,
    history: Vec<Move>,
    repetitions: HashMap<String, u32>,
}

impl StandardRules {
    /// Creates a game in the starting position.
    pub fn new() -> Self {
        Self::with_position(Chess::default())
    }

    /// Creates a game from an arbitrary FEN position.
    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let invalid = |reason: String| RulesError::InvalidFen {
            fen: fen.to_string(),
            reason,
        };
        let setup = Fen::from_ascii(fen.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let position: Chess = setup
            .into_position(CastlingMode::Standard)
            .map_err(|e| invalid(e.to_string()))?;
        Ok(Self::with_position(position))
    }

    fn with_position(position: Chess) -> Self {
        let mut rules = Self {
            position,
            history: Vec::new(),
            repetitions: HashMap::new(),
        };
        rules.record_position();
        rules
    }

    fn record_position(&mut self) {
        *self.repetitions.entry(self.repetition_key()).or_insert(0) += 1;
    }

    /// Placement, side to move, castling rights and en passant square. The
    /// clocks are excluded so identical positions compare equal.
    fn repetition_key(&self) -> String {
        self.fen()
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn legal_pairs(&self) -> Vec<(Move, shakmaty::Move)> {
        self.position
            .legal_moves()
            .into_iter()
            .filter_map(|m| {
                let token = m.to_uci(CastlingMode::Standard).to_string();
                Move::parse_uci(&token).map(|ours| (ours, m))
            })
            .collect()
    }
}

impl Default for StandardRules {
    fn default() -> Self {
        Self::new()
    }
}

impl RulesAuthority for StandardRules {
    fn apply_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<Move, MoveRejected> {
        let candidates: Vec<_> = self
            .legal_pairs()
            .into_iter()
            .filter(|(mv, _)| mv.from == from && mv.to == to)
            .collect();

        let wanted = promotion.unwrap_or(Promotion::Queen);
        let chosen = candidates
            .iter()
            .find(|(mv, _)| mv.promotion.is_none() || mv.promotion == Some(wanted))
            .ok_or(MoveRejected { from, to })?;

        let (applied, inner) = chosen.clone();
        self.position.play_unchecked(&inner);
        self.history.push(applied);
        self.record_position();
        tracing::trace!(%applied, fen = %self.fen(), "move applied");
        Ok(applied)
    }

    fn is_checkmate(&self) -> bool {
        self.position.is_checkmate()
    }

    fn is_draw(&self) -> bool {
        self.position.halfmoves() >= FIFTY_MOVE_HALFMOVES
    }

    fn is_stalemate(&self) -> bool {
        self.position.is_stalemate()
    }

    fn is_insufficient_material(&self) -> bool {
        self.position.is_insufficient_material()
    }

    fn is_threefold_repetition(&self) -> bool {
        self.repetitions
            .get(&self.repetition_key())
            .is_some_and(|&count| count >= REPETITION_LIMIT)
    }

    fn turn(&self) -> Color {
        match self.position.turn() {
            shakmaty::Color::White => Color::White,
            shakmaty::Color::Black => Color::Black,
        }
    }

    fn fen(&self) -> String {
        Fen::from_position(self.position.clone(), EnPassantMode::Legal).to_string()
    }

    fn legal_moves(&self) -> Vec<Move> {
        self.legal_pairs().into_iter().map(|(mv, _)| mv).collect()
    }

    fn history_len(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const STARTING: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    fn play(rules: &mut StandardRules, moves: &[&str]) {
        for token in moves {
            let mv = Move::parse_uci(token).unwrap();
            rules.apply_move(mv.from, mv.to, mv.promotion).unwrap();
        }
    }

    #[test]
    fn test_starting_position() {
        let rules = StandardRules::new();
        assert_eq!(rules.fen(), STARTING);
        assert_eq!(rules.turn(), Color::White);
        assert_eq!(rules.legal_moves().len(), 20);
        assert_eq!(rules.history_len(), 0);
    }

    #[test]
    fn test_apply_legal_move() {
        let mut rules = StandardRules::new();
        let mv = rules.apply_move(sq("e2"), sq("e4"), None).unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        assert_eq!(rules.turn(), Color::Black);
        assert_eq!(rules.history_len(), 1);
    }

    #[test]
    fn test_illegal_move_leaves_position() {
        let mut rules = StandardRules::new();
        let before = rules.fen();
        let err = rules.apply_move(sq("e2"), sq("e5"), None).unwrap_err();
        assert_eq!(err.from, sq("e2"));
        assert_eq!(rules.fen(), before);
        assert_eq!(rules.history_len(), 0);
    }

    #[test]
    fn test_fools_mate_is_checkmate() {
        let mut rules = StandardRules::new();
        play(&mut rules, &["f2f3", "e7e5", "g2g4", "d8h4"]);
        assert!(rules.is_checkmate());
        assert_eq!(rules.turn(), Color::White);
        assert!(!rules.is_stalemate());
    }

    #[test]
    fn test_promotion_defaults_to_queen() {
        let mut rules = StandardRules::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mv = rules.apply_move(sq("a7"), sq("a8"), None).unwrap();
        assert_eq!(mv.promotion, Some(Promotion::Queen));
    }

    #[test]
    fn test_promotion_hint_is_honored() {
        let mut rules = StandardRules::from_fen("7k/P7/8/8/8/8/8/K7 w - - 0 1").unwrap();
        let mv = rules
            .apply_move(sq("a7"), sq("a8"), Some(Promotion::Knight))
            .unwrap();
        assert_eq!(mv.to_string(), "a7a8n");
    }

    #[test]
    fn test_castling_uses_king_destination() {
        let mut rules =
            StandardRules::from_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let mv = rules.apply_move(sq("e1"), sq("g1"), None).unwrap();
        assert_eq!(mv.to_string(), "e1g1");
    }

    #[test]
    fn test_stalemate() {
        let rules = StandardRules::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1").unwrap();
        assert!(rules.is_stalemate());
        assert!(!rules.is_checkmate());
    }

    #[test]
    fn test_insufficient_material() {
        let rules = StandardRules::from_fen("8/8/8/4k3/8/8/8/4K3 w - - 0 1").unwrap();
        assert!(rules.is_insufficient_material());
    }

    #[test]
    fn test_fifty_move_draw() {
        let rules = StandardRules::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 100 80").unwrap();
        assert!(rules.is_draw());
        let fresh = StandardRules::from_fen("8/8/8/4k3/8/8/8/R3K3 w - - 99 80").unwrap();
        assert!(!fresh.is_draw());
    }

    #[test]
    fn test_threefold_repetition() {
        let mut rules = StandardRules::new();
        play(&mut rules, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert!(!rules.is_threefold_repetition());
        play(&mut rules, &["g1f3", "g8f6", "f3g1", "f6g8"]);
        assert!(rules.is_threefold_repetition());
    }

    #[test]
    fn test_invalid_fen() {
        assert!(StandardRules::from_fen("invalid").is_err());
    }
}
