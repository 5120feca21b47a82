//! UCI text protocol: the commands we send and the lines we understand.

use std::fmt;

use quizchess_core::Move;

/// A line sent to the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position { fen: String },
    Go { depth: u8 },
    Stop,
    Quit,
}

impl fmt::Display for EngineCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineCommand::Uci => write!(f, "uci"),
            EngineCommand::IsReady => write!(f, "isready"),
            EngineCommand::UciNewGame => write!(f, "ucinewgame"),
            EngineCommand::Position { fen } => write!(f, "position fen {fen}"),
            EngineCommand::Go { depth } => write!(f, "go depth {depth}"),
            EngineCommand::Stop => write!(f, "stop"),
            EngineCommand::Quit => write!(f, "quit"),
        }
    }
}

/// A line received from the engine.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineLine {
    Id,
    UciOk,
    ReadyOk,
    Info,
    /// `None` when the engine reported that no move exists, or the move
    /// token was unreadable.
    BestMove(Option<Move>),
    Other,
}

impl EngineLine {
    pub fn parse(line: &str) -> Self {
        let mut parts = line.split_whitespace();
        match parts.next() {
            Some("id") => EngineLine::Id,
            Some("uciok") => EngineLine::UciOk,
            Some("readyok") => EngineLine::ReadyOk,
            Some("info") => EngineLine::Info,
            Some("bestmove") => EngineLine::BestMove(parts.next().and_then(Move::parse_uci)),
            _ => EngineLine::Other,
        }
    }
}

/// Extracts the best move from a raw `bestmove` reply.
///
/// Returns `None` for the `(none)` / `0000` sentinels, for a missing or
/// malformed move token, and for lines that are not `bestmove` replies.
pub fn parse_reply(raw: &str) -> Option<Move> {
    match EngineLine::parse(raw.trim()) {
        EngineLine::BestMove(mv) => mv,
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_lines() {
        assert_eq!(EngineCommand::Uci.to_string(), "uci");
        assert_eq!(EngineCommand::UciNewGame.to_string(), "ucinewgame");
        assert_eq!(
            EngineCommand::Position {
                fen: "8/8/8/4k3/8/8/8/4K3 w - - 0 1".to_string()
            }
            .to_string(),
            "position fen 8/8/8/4k3/8/8/8/4K3 w - - 0 1"
        );
        assert_eq!(EngineCommand::Go { depth: 4 }.to_string(), "go depth 4");
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(EngineLine::parse("id name Stockfish 16"), EngineLine::Id);
        assert_eq!(EngineLine::parse("uciok"), EngineLine::UciOk);
        assert_eq!(EngineLine::parse("readyok"), EngineLine::ReadyOk);
        assert_eq!(
            EngineLine::parse("info depth 3 score cp 20 nodes 100 pv e2e4"),
            EngineLine::Info
        );
        assert_eq!(EngineLine::parse(""), EngineLine::Other);
        assert_eq!(EngineLine::parse("option name Hash"), EngineLine::Other);
    }

    #[test]
    fn test_parse_reply() {
        assert_eq!(
            parse_reply("bestmove e7e5 ponder g1f3").map(|m| m.to_string()),
            Some("e7e5".to_string())
        );
        assert_eq!(
            parse_reply("bestmove a2a1q\n").map(|m| m.to_string()),
            Some("a2a1q".to_string())
        );
        assert_eq!(parse_reply("bestmove (none)"), None);
        assert_eq!(parse_reply("bestmove 0000"), None);
        assert_eq!(parse_reply("bestmove"), None);
        assert_eq!(parse_reply("bestmove zz99"), None);
        assert_eq!(parse_reply("info depth 1"), None);
    }
}
