//! Session identifiers
//!
//! A game id is drawn at random and rendered as `game_` followed by five
//! octal digits, which keeps it short enough to read out to another player.

use std::{fmt::Display, num::ParseIntError, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Minimum value for generated game IDs (in octal: 10000)
const MIN_VALUE: u16 = 0o10_000;
/// Maximum value for generated game IDs (in octal: 100000)
const MAX_VALUE: u16 = 0o100_000;

const PREFIX: &str = "game_";

/// A unique identifier for a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GameId(u16);

/// Errors raised while parsing a game id
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The text does not start with `game_`
    #[error("game id must start with game_")]
    MissingPrefix,
    /// The digits after the prefix are not octal
    #[error("invalid game id digits: {0}")]
    Digits(#[from] ParseIntError),
}

impl GameId {
    /// Creates a new random game ID
    pub fn new() -> Self {
        Self(fastrand::u16(MIN_VALUE..MAX_VALUE))
    }
}

impl Default for GameId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for GameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{PREFIX}{:05o}", self.0)
    }
}

impl Serialize for GameId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GameId {
    fn deserialize<D>(deserializer: D) -> Result<GameId, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        GameId::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl FromStr for GameId {
    type Err = Error;

    /// Parses `game_` followed by octal digits
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is missing or the digits are not a
    /// valid octal number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix(PREFIX).ok_or(Error::MissingPrefix)?;
        Ok(Self(u16::from_str_radix(digits, 8)?))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_game_id_new_in_range() {
        for _ in 0..100 {
            let id = GameId::new();
            assert!(id.0 >= MIN_VALUE);
            assert!(id.0 < MAX_VALUE);
        }
    }

    #[test]
    fn test_game_id_display_format() {
        assert_eq!(GameId(MIN_VALUE).to_string(), "game_10000");
        assert_eq!(GameId(MAX_VALUE - 1).to_string(), "game_77777");
    }

    #[test]
    fn test_game_id_from_str() {
        assert_eq!(GameId::from_str("game_12345").unwrap(), GameId(0o12345));
        assert_eq!(GameId::from_str("12345"), Err(Error::MissingPrefix));
        assert!(matches!(
            GameId::from_str("game_888"),
            Err(Error::Digits(_))
        ));
        assert!(GameId::from_str("game_").is_err());
    }

    #[test]
    fn test_game_id_serialization() {
        let id = GameId(0o12345);
        let serialized = serde_json::to_string(&id).unwrap();
        assert_eq!(serialized, "\"game_12345\"");

        let deserialized: GameId = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, id);
    }

    #[test]
    fn test_game_id_deserialization_error() {
        assert!(serde_json::from_str::<GameId>("123").is_err());
        assert!(serde_json::from_str::<GameId>("\"game_999\"").is_err());
    }
}
