use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Represents one of the two players in chess.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    White,
    Black,
}

impl Color {
    /// Returns the opposite color.
    pub const fn opponent(self) -> Self {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

/// Pieces a pawn may promote to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Promotion {
    Queen,
    Rook,
    Bishop,
    Knight,
}

impl Promotion {
    /// Parses the lowercase or uppercase UCI suffix.
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'q' | 'Q' => Some(Promotion::Queen),
            'r' | 'R' => Some(Promotion::Rook),
            'b' | 'B' => Some(Promotion::Bishop),
            'n' | 'N' => Some(Promotion::Knight),
            _ => None,
        }
    }

    /// Returns the UCI suffix character.
    pub const fn to_char(self) -> char {
        match self {
            Promotion::Queen => 'q',
            Promotion::Rook => 'r',
            Promotion::Bishop => 'b',
            Promotion::Knight => 'n',
        }
    }
}

/// A file on the chess board (a-h).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct File(u8);

impl File {
    /// Creates a file from a character ('a'-'h').
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            'a'..='h' => Some(File(c as u8 - b'a')),
            _ => None,
        }
    }

    /// Returns the file as a character ('a'-'h').
    pub const fn to_char(self) -> char {
        (b'a' + self.0) as char
    }
}

/// A rank on the chess board (1-8).
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Rank(u8);

impl Rank {
    /// Creates a rank from a digit ('1'-'8').
    pub const fn from_char(c: char) -> Option<Self> {
        match c {
            '1'..='8' => Some(Rank(c as u8 - b'1')),
            _ => None,
        }
    }

    /// Returns the rank as a character ('1'-'8').
    pub const fn to_char(self) -> char {
        (b'1' + self.0) as char
    }
}

/// A square on the chess board.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Square(u8);

impl Square {
    /// Creates a new square from file and rank.
    pub const fn new(file: File, rank: Rank) -> Self {
        Square(rank.0 * 8 + file.0)
    }

    pub const fn file(self) -> File {
        File(self.0 % 8)
    }

    pub const fn rank(self) -> Rank {
        Rank(self.0 / 8)
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.file().to_char(), self.rank().to_char())
    }
}

/// Error returned when a square or move token cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {what}: {input:?}")]
pub struct ParseError {
    what: &'static str,
    input: String,
}

impl FromStr for Square {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let parsed = match (chars.next(), chars.next(), chars.next()) {
            (Some(f), Some(r), None) => File::from_char(f).zip(Rank::from_char(r)),
            _ => None,
        };
        parsed
            .map(|(file, rank)| Square::new(file, rank))
            .ok_or_else(|| ParseError {
                what: "square",
                input: s.to_string(),
            })
    }
}

/// A chess move in long algebraic (UCI) form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Promotion>,
}

impl Move {
    /// Parses a UCI move token such as `e2e4` or `e7e8q`.
    ///
    /// Returns `None` for malformed tokens and for the null-move sentinels
    /// `0000` and `(none)` that engines emit when no move exists.
    pub fn parse_uci(token: &str) -> Option<Self> {
        if token == "0000" || token == "(none)" || !token.is_ascii() {
            return None;
        }
        if token.len() != 4 && token.len() != 5 {
            return None;
        }

        let from = token[0..2].parse::<Square>().ok()?;
        let to = token[2..4].parse::<Square>().ok()?;
        let promotion = match token[4..].chars().next() {
            Some(c) => Some(Promotion::from_char(c)?),
            None => None,
        };

        Some(Self {
            from,
            to,
            promotion,
        })
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(promotion) = self.promotion {
            write!(f, "{}", promotion.to_char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Move::parse_uci(s).ok_or_else(|| ParseError {
            what: "move",
            input: s.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_opponent() {
        assert_eq!(Color::White.opponent(), Color::Black);
        assert_eq!(Color::Black.opponent(), Color::White);
    }

    #[test]
    fn test_square_creation() {
        let e4 = Square::new(File::from_char('e').unwrap(), Rank::from_char('4').unwrap());
        assert_eq!(e4.file().to_char(), 'e');
        assert_eq!(e4.rank().to_char(), '4');
        assert_eq!(format!("{}", e4), "e4");
        assert_eq!("e4".parse::<Square>().unwrap(), e4);
    }

    #[test]
    fn test_invalid_squares() {
        assert!("i1".parse::<Square>().is_err());
        assert!("a9".parse::<Square>().is_err());
        assert!("a".parse::<Square>().is_err());
        assert!("a10".parse::<Square>().is_err());
    }

    #[test]
    fn test_parse_uci_moves() {
        let mv = Move::parse_uci("e2e4").unwrap();
        assert_eq!(mv.to_string(), "e2e4");
        assert!(mv.promotion.is_none());

        let promo = Move::parse_uci("e7e8q").unwrap();
        assert_eq!(promo.promotion, Some(Promotion::Queen));
        assert_eq!(promo.to_string(), "e7e8q");
    }

    #[test]
    fn test_null_move_sentinels() {
        assert!(Move::parse_uci("0000").is_none());
        assert!(Move::parse_uci("(none)").is_none());
        assert!(Move::parse_uci("e2").is_none());
        assert!(Move::parse_uci("e7e8x").is_none());
        assert!(Move::parse_uci("e2e4e5").is_none());
    }
}
