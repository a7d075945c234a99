//! Player scores
//!
//! Scores outlive sessions: a player keeps their points when a round is
//! regenerated, when they leave a session, and when they join another one.
//! The board is shared by every connection, so all access goes through a
//! single lock and a write is visible to the very next read.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use itertools::Itertools;
use serde::Serialize;

use super::{
    TruncatedVec,
    constants::{leaderboard, score},
    player::PlayerId,
};

/// A player's place in the standings
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Standing {
    /// The player
    pub player: PlayerId,
    /// Total points
    pub points: u64,
}

/// Process-wide mapping from player to score
#[derive(Debug, Default)]
pub struct ScoreBoard {
    scores: RwLock<HashMap<PlayerId, u64>>,
}

impl ScoreBoard {
    /// Creates an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes sure the player has an entry, starting at zero
    pub fn ensure(&self, player: &PlayerId) {
        self.update(player, |points| points);
    }

    /// Current score of a player, zero if unknown
    pub fn score(&self, player: &PlayerId) -> u64 {
        self.scores
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(player)
            .copied()
            .unwrap_or_default()
    }

    /// Awards the reward for a correct slice and returns the new score
    pub fn reward(&self, player: &PlayerId) -> u64 {
        self.update(player, |points| points.saturating_add(score::REWARD))
    }

    /// Deducts the penalty for a wrong slice, never dropping below zero,
    /// and returns the new score
    pub fn penalize(&self, player: &PlayerId) -> u64 {
        self.update(player, |points| points.saturating_sub(score::PENALTY))
    }

    /// Drops the player's entry entirely
    pub fn forget(&self, player: &PlayerId) -> Option<u64> {
        self.scores
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(player)
    }

    /// Players by descending score (ties by identity), at most `limit` of
    /// them, along with the total number of known players
    pub fn standings(&self, limit: usize) -> TruncatedVec<Standing> {
        let scores = self.scores.read().unwrap_or_else(PoisonError::into_inner);

        TruncatedVec::new(
            scores
                .iter()
                .sorted_by(|(a_id, a_points), (b_id, b_points)| {
                    b_points.cmp(a_points).then_with(|| a_id.cmp(b_id))
                })
                .map(|(player, points)| Standing {
                    player: player.clone(),
                    points: *points,
                }),
            limit.min(leaderboard::MAX_LIMIT),
            scores.len(),
        )
    }

    fn update<F: FnOnce(u64) -> u64>(&self, player: &PlayerId, f: F) -> u64 {
        let mut scores = self.scores.write().unwrap_or_else(PoisonError::into_inner);
        let points = scores.entry(player.clone()).or_default();
        *points = f(*points);
        *points
    }
}
