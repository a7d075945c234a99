//! Configuration constants for the fruit slicing game
//!
//! This module contains the limits and tuning values used throughout the
//! game, grouped by the component that consumes them.

/// Session roster and registry limits
pub mod session {
    /// Minimum number of players a session may be created for
    pub const MIN_PLAYERS: usize = 1;
    /// Maximum number of players a session may be created for
    pub const MAX_PLAYERS: usize = 4;
    /// Maximum number of sessions kept alive at the same time
    pub const MAX_SESSION_COUNT: usize = 10_000;
    /// Roster capacity of sessions created without naming one
    pub const DEFAULT_MAX_PLAYERS: usize = 1;
    /// Label given to sessions that do not name their game type
    pub const DEFAULT_GAME_TYPE: &str = "math_fruit";
    /// Maximum length of a game type label
    pub const MAX_GAME_TYPE_LENGTH: usize = 50;
}

/// Scoring rules
pub mod score {
    /// Points awarded for slicing the correct fruit
    pub const REWARD: u64 = 10;
    /// Points deducted for slicing a wrong fruit (floored at zero)
    pub const PENALTY: u64 = 5;
}

/// Problem generation tuning
pub mod problem {
    /// Smallest operand drawn for arithmetic tiers
    pub const MIN_OPERAND: i64 = 1;
    /// Largest operand drawn for arithmetic tiers
    pub const MAX_OPERAND: i64 = 5;
    /// Smallest integer offset applied to elementary decoys
    pub const MIN_ELEMENTARY_OFFSET: i64 = 1;
    /// Largest integer offset applied to elementary decoys
    pub const MAX_ELEMENTARY_OFFSET: i64 = 3;
    /// Smallest real offset applied to highschool decoys
    pub const MIN_HIGHSCHOOL_OFFSET: f64 = 1.0;
    /// Largest real offset applied to highschool decoys
    pub const MAX_HIGHSCHOOL_OFFSET: f64 = 2.0;
}

/// Fruit placement in the unit square
pub mod layout {
    /// Minimum distance between two fruits
    pub const MIN_DISTANCE: f64 = 0.1;
    /// Samples drawn per fruit before an overlapping spot is accepted
    pub const MAX_ATTEMPTS: usize = 100;
    /// Lowest coordinate a fruit may be placed at
    pub const MIN_COORDINATE: f64 = 0.1;
    /// Highest coordinate a fruit may be placed at
    pub const MAX_COORDINATE: f64 = 0.9;
}

/// Bearer credential settings
pub mod auth {
    /// Length of issued bearer tokens
    pub const TOKEN_LENGTH: usize = 32;
}

/// Leaderboard rendering
pub mod leaderboard {
    /// Upper bound on the number of standings returned in one listing
    pub const MAX_LIMIT: usize = 50;
}
