//! The session state machine.
//!
//! A [`Session`] owns the rules, the quiz deck and the rng, and changes state
//! only through three triggers: a player move, a quiz answer and an engine
//! reply. Every trigger is applied completely or not at all; a rejected
//! trigger leaves the session untouched.
//!
//! ```text
//! AwaitingPlayerMove --legal move--> AwaitingQuizAnswer --answer--> EngineThinking
//!        ^                                                               |
//!        +---------------------------- reply ----------------------------+
//! ```
//!
//! Any transition that ends the game moves to `Over`, after which every
//! trigger is rejected.

use quizchess_core::{
    evaluate, player_full_moves, Catalog, Color, DifficultyBands, Move, MoveRejected, Narratives,
    Outcome, Promotion, QuizDeck, QuizQuestion, RulesAuthority, ScoreBreakdown, Square,
};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::leaderboard::ScoreRecord;

/// Where the session is in the move / quiz / engine round.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    AwaitingPlayerMove,
    /// The player has moved; the quiz must be answered before the engine
    /// replies.
    AwaitingQuizAnswer,
    /// An engine request is in flight. Only the reply carrying this ticket
    /// is accepted.
    EngineThinking { ticket: u64 },
    Over,
}

/// Search request for the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineRequest {
    pub ticket: u64,
    pub fen: String,
    pub depth: u8,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MoveEffect {
    /// The move stands and the quiz is shown.
    QuizRevealed { played: Move },
    SessionOver { played: Move, outcome: Outcome },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AnswerEffect {
    EngineRequested(EngineRequest),
    /// The opponent skipped the search and played a random legal move.
    RandomMove {
        played: Move,
        outcome: Option<Outcome>,
    },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReplyEffect {
    PlayerToMove { played: Option<Move> },
    SessionOver {
        played: Option<Move>,
        outcome: Outcome,
    },
}

/// Why a trigger was not applied.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("the session is over")]
    SessionOver,
    #[error(transparent)]
    IllegalMove(#[from] MoveRejected),
    #[error("not accepted while {0:?}")]
    WrongPhase(Phase),
    #[error("it is {0}'s turn")]
    NotYourTurn(Color),
    #[error("choice {choice} is out of range for {options} options")]
    InvalidChoice { choice: usize, options: usize },
    #[error("reply for request {got} does not match the request in flight ({expected:?})")]
    StaleReply { got: u64, expected: Option<u64> },
}

/// Per-session tunables.
#[derive(Clone, Debug)]
pub struct SessionSettings {
    pub player_name: String,
    pub bands: DifficultyBands,
    /// Chance that a correct answer makes the opponent play a random legal
    /// move instead of searching.
    pub easy_random_move_chance: f64,
    pub narratives: Narratives,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            player_name: "Player".to_string(),
            bands: DifficultyBands::default(),
            easy_random_move_chance: 0.0,
            narratives: Narratives::default(),
        }
    }
}

pub struct Session<R, G> {
    rules: R,
    deck: QuizDeck,
    rng: G,
    settings: SessionSettings,
    human: Color,
    phase: Phase,
    quiz_visible: bool,
    correct: u32,
    incorrect: u32,
    next_ticket: u64,
    narrative: String,
    outcome: Option<Outcome>,
    score: Option<ScoreBreakdown>,
}

impl<R: RulesAuthority, G: Rng> Session<R, G> {
    /// Starts a session. The human plays the side to move in `rules`.
    pub fn new(rules: R, catalog: &Catalog, settings: SessionSettings, mut rng: G) -> Self {
        let deck = QuizDeck::new(catalog, &mut rng);
        let human = rules.turn();
        let narrative = settings.narratives.opening.clone();
        tracing::info!(player = %settings.player_name, %human, questions = catalog.len(), "session started");

        Self {
            rules,
            deck,
            rng,
            settings,
            human,
            phase: Phase::AwaitingPlayerMove,
            quiz_visible: true,
            correct: 0,
            incorrect: 0,
            next_ticket: 1,
            narrative,
            outcome: None,
            score: None,
        }
    }

    /// A player move attempt.
    pub fn submit_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<MoveEffect, Rejection> {
        self.expect_phase(Phase::AwaitingPlayerMove)?;
        let turn = self.rules.turn();
        if turn != self.human {
            return Err(Rejection::NotYourTurn(turn));
        }

        let played = self.rules.apply_move(from, to, promotion).inspect_err(|e| {
            tracing::debug!(error = %e, "player move rejected");
        })?;
        tracing::debug!(%played, "player moved");

        if let Some(outcome) = evaluate(&self.rules) {
            self.finish(outcome);
            return Ok(MoveEffect::SessionOver { played, outcome });
        }

        self.phase = Phase::AwaitingQuizAnswer;
        self.quiz_visible = true;
        Ok(MoveEffect::QuizRevealed { played })
    }

    /// Answers the current question with the option at index `choice`.
    pub fn answer_quiz(&mut self, choice: usize) -> Result<AnswerEffect, Rejection> {
        self.expect_phase(Phase::AwaitingQuizAnswer)?;

        let question = self.deck.current();
        if choice >= question.options.len() {
            return Err(Rejection::InvalidChoice {
                choice,
                options: question.options.len(),
            });
        }

        let was_correct = question.is_correct(choice);
        self.narrative = if was_correct {
            self.correct += 1;
            question.on_correct.clone()
        } else {
            self.incorrect += 1;
            question.on_incorrect.clone()
        };
        tracing::debug!(question = question.id, was_correct, "quiz answered");

        let advance = self.deck.advance(&mut self.rng);
        if advance.reshuffled {
            tracing::info!(reshuffles = self.deck.reshuffle_count(), "quiz deck reshuffled");
        }
        self.quiz_visible = false;

        if was_correct && self.rolls_random_move() {
            if let Some(effect) = self.play_random_move() {
                return Ok(effect);
            }
        }

        let depth = self.settings.bands.select_depth(was_correct, &mut self.rng);
        let ticket = self.next_ticket;
        self.next_ticket += 1;
        self.phase = Phase::EngineThinking { ticket };
        tracing::debug!(ticket, depth, "engine request issued");

        Ok(AnswerEffect::EngineRequested(EngineRequest {
            ticket,
            fen: self.rules.fen(),
            depth,
        }))
    }

    /// Applies the engine's reply to request `ticket`. `None` means the
    /// engine had no move; the position is still re-evaluated.
    ///
    /// The opponent never passes. If the game goes on and the reply gave no
    /// usable move, a random legal move is played for the opponent so the
    /// turn returns to the human.
    pub fn receive_engine_reply(
        &mut self,
        ticket: u64,
        best_move: Option<Move>,
    ) -> Result<ReplyEffect, Rejection> {
        match self.phase {
            Phase::Over => return Err(Rejection::SessionOver),
            Phase::EngineThinking { ticket: expected } if expected == ticket => {}
            Phase::EngineThinking { ticket: expected } => {
                return Err(Rejection::StaleReply {
                    got: ticket,
                    expected: Some(expected),
                })
            }
            _ => {
                return Err(Rejection::StaleReply {
                    got: ticket,
                    expected: None,
                })
            }
        }

        let mut played = best_move.and_then(|mv| {
            match self.rules.apply_move(mv.from, mv.to, mv.promotion) {
                Ok(played) => Some(played),
                Err(e) => {
                    tracing::warn!(error = %e, "engine suggested an illegal move, ignoring it");
                    None
                }
            }
        });
        match played {
            Some(mv) => tracing::debug!(%mv, ticket, "engine moved"),
            None => tracing::debug!(ticket, "engine reported no move"),
        }

        let mut outcome = evaluate(&self.rules);
        if played.is_none() && outcome.is_none() && self.rules.turn() != self.human {
            played = self.random_legal_move();
            if let Some(mv) = played {
                tracing::warn!(%mv, ticket, "no engine move, played a random one instead");
            }
            outcome = evaluate(&self.rules);
        }

        if let Some(outcome) = outcome {
            self.finish(outcome);
            return Ok(ReplyEffect::SessionOver { played, outcome });
        }

        self.phase = Phase::AwaitingPlayerMove;
        self.quiz_visible = false;
        Ok(ReplyEffect::PlayerToMove { played })
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_over(&self) -> bool {
        self.phase == Phase::Over
    }

    pub fn is_engine_thinking(&self) -> bool {
        matches!(self.phase, Phase::EngineThinking { .. })
    }

    pub fn is_quiz_visible(&self) -> bool {
        self.quiz_visible
    }

    /// The question on screen, if the quiz is visible.
    pub fn visible_question(&self) -> Option<&QuizQuestion> {
        self.quiz_visible.then(|| self.deck.current())
    }

    pub fn quiz_progress(&self) -> (usize, usize) {
        self.deck.progress()
    }

    pub fn narrative(&self) -> &str {
        &self.narrative
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn human(&self) -> Color {
        self.human
    }

    pub fn turn(&self) -> Color {
        self.rules.turn()
    }

    pub fn fen(&self) -> String {
        self.rules.fen()
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn correct_count(&self) -> u32 {
        self.correct
    }

    pub fn incorrect_count(&self) -> u32 {
        self.incorrect
    }

    pub fn reshuffle_count(&self) -> u32 {
        self.deck.reshuffle_count()
    }

    /// Score terms, once the session is over.
    pub fn score_breakdown(&self) -> Option<ScoreBreakdown> {
        self.score
    }

    pub fn score(&self) -> Option<u32> {
        self.score.map(|s| s.total())
    }

    /// The record to submit to the leaderboard, once the session is over.
    pub fn score_record(&self) -> Option<ScoreRecord> {
        self.score().map(|score| ScoreRecord {
            name: self.settings.player_name.clone(),
            score,
        })
    }

    fn expect_phase(&self, wanted: Phase) -> Result<(), Rejection> {
        match self.phase {
            Phase::Over => Err(Rejection::SessionOver),
            phase if phase == wanted => Ok(()),
            phase => Err(Rejection::WrongPhase(phase)),
        }
    }

    fn rolls_random_move(&mut self) -> bool {
        let chance = self.settings.easy_random_move_chance;
        chance > 0.0 && self.rng.gen_bool(chance.min(1.0))
    }

    fn random_legal_move(&mut self) -> Option<Move> {
        let candidate = *self.rules.legal_moves().choose(&mut self.rng)?;
        self.rules
            .apply_move(candidate.from, candidate.to, candidate.promotion)
            .ok()
    }

    fn play_random_move(&mut self) -> Option<AnswerEffect> {
        let played = self.random_legal_move()?;
        tracing::debug!(%played, "opponent played a random move");

        let outcome = evaluate(&self.rules);
        match outcome {
            Some(outcome) => self.finish(outcome),
            None => {
                self.phase = Phase::AwaitingPlayerMove;
                self.narrative = self.settings.narratives.random_move.clone();
            }
        }
        Some(AnswerEffect::RandomMove { played, outcome })
    }

    fn finish(&mut self, outcome: Outcome) {
        let half_moves = u32::try_from(self.rules.history_len()).unwrap_or(u32::MAX);
        let breakdown = ScoreBreakdown::new(
            self.correct,
            self.incorrect,
            player_full_moves(half_moves),
            self.deck.reshuffle_count(),
        );

        self.phase = Phase::Over;
        self.quiz_visible = false;
        self.outcome = Some(outcome);
        self.score = Some(breakdown);
        self.narrative = self
            .settings
            .narratives
            .outcome(outcome, self.human)
            .to_string();

        tracing::info!(
            kind = ?outcome.kind,
            winner = ?outcome.winner,
            score = breakdown.total(),
            "session over"
        );
    }
}
