//! Trivia questions and the reshuffling deck that serves them.

use std::collections::{HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One multiple-choice question.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_option: String,
    /// Line spoken by the opponent after a correct answer.
    pub on_correct: String,
    /// Line spoken by the opponent after an incorrect answer.
    pub on_incorrect: String,
}

impl QuizQuestion {
    /// Returns true if the option at `choice` is the correct one.
    pub fn is_correct(&self, choice: usize) -> bool {
        self.options
            .get(choice)
            .is_some_and(|option| *option == self.correct_option)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("duplicate question id {0}")]
    DuplicateId(u32),
    #[error("question {0} has no options")]
    NoOptions(u32),
    #[error("question {id} repeats option {option:?}")]
    DuplicateOption { id: u32, option: String },
    #[error("question {id}: correct option {option:?} is not among its options")]
    UnknownCorrectOption { id: u32, option: String },
    #[error("malformed catalog JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A validated, immutable, ordered set of questions.
#[derive(Clone, Debug)]
pub struct Catalog {
    questions: Vec<QuizQuestion>,
}

impl Catalog {
    pub fn new(questions: Vec<QuizQuestion>) -> Result<Self, CatalogError> {
        if questions.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut ids = HashSet::new();
        for question in &questions {
            if !ids.insert(question.id) {
                return Err(CatalogError::DuplicateId(question.id));
            }
            if question.options.is_empty() {
                return Err(CatalogError::NoOptions(question.id));
            }
            let mut seen = HashSet::new();
            for option in &question.options {
                if !seen.insert(option.as_str()) {
                    return Err(CatalogError::DuplicateOption {
                        id: question.id,
                        option: option.clone(),
                    });
                }
            }
            if !seen.contains(question.correct_option.as_str()) {
                return Err(CatalogError::UnknownCorrectOption {
                    id: question.id,
                    option: question.correct_option.clone(),
                });
            }
        }

        Ok(Self { questions })
    }

    /// Loads a catalog from a JSON array of questions.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let questions: Vec<QuizQuestion> = serde_json::from_str(json)?;
        Self::new(questions)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[QuizQuestion] {
        &self.questions
    }
}

/// Result of one [`QuizDeck::advance`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Advance {
    /// The draw pile was empty and the discard pile was reshuffled.
    pub reshuffled: bool,
}

/// Draw pile, discard pile and the question currently shown.
///
/// Every catalog question is in exactly one of `current`, the draw pile or
/// the discard pile.
#[derive(Clone, Debug)]
pub struct QuizDeck {
    current: QuizQuestion,
    draw_pile: VecDeque<QuizQuestion>,
    discard_pile: Vec<QuizQuestion>,
    reshuffle_count: u32,
    /// Questions dealt in the current pass, counting `current`.
    pass_len: usize,
}

impl QuizDeck {
    /// Shuffles the full catalog; the first question becomes current.
    pub fn new<R: Rng + ?Sized>(catalog: &Catalog, rng: &mut R) -> Self {
        let mut order = catalog.questions.clone();
        order.shuffle(rng);
        let mut draw_pile: VecDeque<_> = order.into();
        // Catalog::new guarantees at least one question.
        let current = draw_pile
            .pop_front()
            .unwrap_or_else(|| catalog.questions[0].clone());

        Self {
            current,
            draw_pile,
            discard_pile: Vec::new(),
            reshuffle_count: 0,
            pass_len: catalog.len(),
        }
    }

    pub fn current(&self) -> &QuizQuestion {
        &self.current
    }

    pub fn draw_pile(&self) -> impl Iterator<Item = &QuizQuestion> {
        self.draw_pile.iter()
    }

    pub fn discard_pile(&self) -> &[QuizQuestion] {
        &self.discard_pile
    }

    pub fn reshuffle_count(&self) -> u32 {
        self.reshuffle_count
    }

    /// 1-based position of the current question within this pass, and the
    /// number of questions in the pass. A pass after a reshuffle holds every
    /// question except the one retired just before it.
    pub fn progress(&self) -> (usize, usize) {
        (self.pass_len - self.draw_pile.len(), self.pass_len)
    }

    /// Retires the current question and draws the next one.
    ///
    /// With an empty draw pile the discard pile is reshuffled to form the
    /// new draw pile; the retiring question is discarded only after that
    /// reshuffle, so it cannot come straight back.
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Advance {
        if let Some(next) = self.draw_pile.pop_front() {
            let finished = std::mem::replace(&mut self.current, next);
            self.discard_pile.push(finished);
            return Advance { reshuffled: false };
        }

        let mut pool = std::mem::take(&mut self.discard_pile);
        pool.shuffle(rng);
        let mut draw_pile: VecDeque<_> = pool.into();
        self.reshuffle_count += 1;

        self.pass_len = draw_pile.len().max(1);
        match draw_pile.pop_front() {
            Some(next) => {
                let finished = std::mem::replace(&mut self.current, next);
                self.draw_pile = draw_pile;
                self.discard_pile.push(finished);
            }
            // Single-question catalog: the only question stays current.
            None => self.draw_pile = draw_pile,
        }

        tracing::debug!(
            reshuffles = self.reshuffle_count,
            "quiz deck exhausted, reshuffled"
        );
        Advance { reshuffled: true }
    }
}
