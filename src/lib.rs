//! # Fruit Slice Game Library
//!
//! This library provides the session core of the fruit-slice quiz game.
//! Players slice the fruit carrying the answer to a generated problem. It
//! handles problem generation, fruit placement, session lifecycles, scoring
//! and the per-connection event loop that drives a session from client
//! messages.

#![cfg_attr(all(coverage_nightly, test), feature(coverage_attribute))]
#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::wildcard_imports)]
use std::fmt::Display;

use derive_where::derive_where;
use itertools::Itertools;
use serde::Serialize;

pub mod constants;

pub mod auth;
pub mod connection;
pub mod game;
pub mod game_id;
pub mod layout;
pub mod lobby;
pub mod player;
pub mod problem;
pub mod random;
pub mod registry;
pub mod scoreboard;
pub mod session;

/// Body of a message reporting a failure to the client
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct ErrorMessage {
    /// Human-readable description
    pub error: String,
}

/// Messages sent from the server to a connected player
///
/// Both variants serialize as bare JSON objects; clients tell them apart by
/// the presence of the `error` field.
#[derive(Debug, Serialize, Clone, derive_more::From)]
#[serde(untagged)]
pub enum OutgoingMessage {
    /// The player's current view of the session
    Snapshot(game::Snapshot),
    /// Something went wrong
    Error(ErrorMessage),
}

impl OutgoingMessage {
    /// Builds an error message from anything printable
    pub fn error(message: impl Display) -> Self {
        Self::Error(ErrorMessage {
            error: message.to_string(),
        })
    }

    /// Converts the message to a JSON string for transmission
    ///
    /// # Panics
    ///
    /// This method panics if serialization fails, which should never happen
    /// with the default JSON serializer for well-formed data.
    pub fn to_message(&self) -> String {
        serde_json::to_string(self).expect("default serializer cannot fail")
    }
}

/// A truncated vector that maintains the exact count while limiting displayed items
///
/// Used for leaderboards: the client gets the top entries along with the
/// number of players that have a score at all.
#[derive(Debug, Clone, Serialize)]
#[derive_where(Default)]
pub struct TruncatedVec<T> {
    /// The exact total count of items
    exact_count: usize,
    /// The truncated list of items (up to the limit)
    items: Vec<T>,
}

impl<T: Clone> TruncatedVec<T> {
    /// Creates a new truncated vector from an iterator
    ///
    /// # Arguments
    ///
    /// * `list` - An iterator over items to include
    /// * `limit` - Maximum number of items to include in the truncated vector
    /// * `exact_count` - The exact total count of items (may be larger than limit)
    pub fn new<I: Iterator<Item = T>>(list: I, limit: usize, exact_count: usize) -> Self {
        let items = list.take(limit).collect_vec();
        Self { exact_count, items }
    }

    /// Maps a function over the items in the truncated vector
    pub fn map<F, U>(self, f: F) -> TruncatedVec<U>
    where
        F: Fn(T) -> U,
    {
        TruncatedVec {
            exact_count: self.exact_count,
            items: self.items.into_iter().map(f).collect_vec(),
        }
    }

    /// Returns the exact count of items
    pub fn exact_count(&self) -> usize {
        self.exact_count
    }

    /// Returns the truncated items
    pub fn items(&self) -> &[T] {
        &self.items
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn test_truncated_vec_new() {
        let truncated = TruncatedVec::new([1, 2, 3, 4, 5].into_iter(), 3, 5);

        assert_eq!(truncated.exact_count(), 5);
        assert_eq!(truncated.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_truncated_vec_limit_larger_than_items() {
        let truncated = TruncatedVec::new([1, 2, 3].into_iter(), 5, 3);

        assert_eq!(truncated.exact_count(), 3);
        assert_eq!(truncated.items(), &[1, 2, 3]);
    }

    #[test]
    fn test_truncated_vec_map() {
        let truncated = TruncatedVec::new([1, 2, 3].into_iter(), 2, 3);
        let mapped = truncated.map(|x| format!("item_{x}"));

        assert_eq!(mapped.exact_count(), 3);
        assert_eq!(mapped.items(), &["item_1", "item_2"]);
    }

    #[test]
    fn test_truncated_vec_serialization() {
        let truncated = TruncatedVec::new(["a"].into_iter(), 1, 4);
        let json = serde_json::to_value(&truncated).unwrap();

        assert_eq!(json, serde_json::json!({"exact_count": 4, "items": ["a"]}));
    }

    #[test]
    fn test_error_message_shape() {
        let message = OutgoingMessage::error("Game not found");

        assert_eq!(message.to_message(), r#"{"error":"Game not found"}"#);
    }

    #[test]
    fn test_snapshot_message_is_bare_object() {
        let snapshot = game::Snapshot {
            problem: "2 + 3".to_owned(),
            fruits: Vec::new(),
            score: 10,
            status: game::Status::Correct,
            timestamp: chrono::Utc::now(),
        };
        let json: serde_json::Value =
            serde_json::from_str(&OutgoingMessage::from(snapshot).to_message()).unwrap();

        assert_eq!(json["problem"], "2 + 3");
        assert_eq!(json["score"], 10);
        assert_eq!(json["status"], "correct");
        assert!(json.get("error").is_none());
    }
}
