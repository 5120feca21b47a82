use crate::rules::RulesAuthority;
use crate::types::Color;

/// Why a game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OutcomeKind {
    Checkmate,
    /// Draw by rule, such as the fifty-move rule.
    Draw,
    Stalemate,
    InsufficientMaterial,
    ThreefoldRepetition,
}

/// A finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Outcome {
    pub kind: OutcomeKind,
    /// Set only for checkmate.
    pub winner: Option<Color>,
}

impl Outcome {
    pub const fn draw(kind: OutcomeKind) -> Self {
        Self { kind, winner: None }
    }
}

/// Inspects the rules after a half-move and reports the outcome, if any.
///
/// Predicates are checked in a fixed order and the first match wins:
/// checkmate, draw by rule, stalemate, insufficient material, threefold
/// repetition. The side to move is the side that was mated.
pub fn evaluate<R: RulesAuthority + ?Sized>(rules: &R) -> Option<Outcome> {
    if rules.is_checkmate() {
        return Some(Outcome {
            kind: OutcomeKind::Checkmate,
            winner: Some(rules.turn().opponent()),
        });
    }

    let kind = if rules.is_draw() {
        OutcomeKind::Draw
    } else if rules.is_stalemate() {
        OutcomeKind::Stalemate
    } else if rules.is_insufficient_material() {
        OutcomeKind::InsufficientMaterial
    } else if rules.is_threefold_repetition() {
        OutcomeKind::ThreefoldRepetition
    } else {
        return None;
    };

    Some(Outcome::draw(kind))
}
