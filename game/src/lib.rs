//! Quiz chess: a chess match against an engine whose strength is set by how
//! well the player answers trivia questions between moves.

pub mod config;
pub mod driver;
pub mod leaderboard;
pub mod session;

pub use config::{Config, ConfigError};
pub use driver::{Match, PersistenceStatus, StartError};
pub use leaderboard::{
    qualifies, HttpLeaderboard, InMemoryLeaderboard, Leaderboard, LeaderboardError, ScoreRecord,
};
pub use session::{
    AnswerEffect, EngineRequest, MoveEffect, Phase, Rejection, ReplyEffect, Session,
    SessionSettings,
};
