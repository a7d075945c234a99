//! Core game logic and state management
//!
//! This module contains the session struct that every connection of a game
//! shares: the current round (problem, correct answer, fruits), the status of
//! the last slice, and the roster of players. All transitions are
//! synchronous; callers serialize access per session.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use log::debug;
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use thiserror::Error;

use super::{
    game_id::GameId,
    layout::{Fruit, Layout},
    player::PlayerId,
    problem::{Answer, Difficulty},
    scoreboard::ScoreBoard,
};

/// Outcome of the last slice in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// A problem is posed and no slice has been judged since
    #[default]
    Waiting,
    /// The last slice hit the correct fruit
    Correct,
    /// The last slice hit a decoy
    Wrong,
}

/// Errors raised by session transitions
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The player is not on the session roster
    #[error("Player not in game")]
    NotMember(PlayerId),
    /// The roster already holds the maximum number of players
    #[error("game is full ({0} players)")]
    SessionFull(usize),
    /// A slice arrived before any problem was generated
    #[error("no active problem")]
    NoActiveProblem,
}

/// Messages a connected player can send
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum IncomingMessage {
    /// The player cut the fruit carrying `value`
    Slice {
        /// The candidate answer on the cut fruit
        value: Answer,
    },
}

impl IncomingMessage {
    /// Parses a raw inbound message
    ///
    /// # Errors
    ///
    /// Fails when the text is not JSON, lacks a `type`, names an unknown
    /// type, or carries a value that is neither a number nor a string.
    pub fn parse(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Full view of a session sent to one player after every change
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Problem text
    pub problem: String,
    /// Fruits currently on the field
    pub fruits: Vec<Fruit>,
    /// The receiving player's score
    pub score: u64,
    /// Status of the session
    pub status: Status,
    /// When the snapshot was taken
    pub timestamp: DateTime<Utc>,
}

/// The immutable parameters a session is created with
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Free-form label for the kind of game
    pub game_type: String,
    /// Problem family
    pub difficulty: Difficulty,
    /// Roster capacity
    pub max_players: usize,
}

/// One posed problem and its fruits
#[derive(Debug, Clone, PartialEq)]
struct Round {
    prompt: String,
    answer: Answer,
    fruits: Vec<Fruit>,
}

/// Listing view of a session
#[skip_serializing_none]
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    /// Kind of game
    #[serde(rename = "type")]
    pub game_type: String,
    /// Status of the session
    pub status: Status,
    /// Players on the roster
    pub players: Vec<PlayerId>,
    /// Roster capacity
    pub max_players: usize,
    /// Problem family
    pub difficulty: Difficulty,
    /// Player who created the session
    pub created_by: PlayerId,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Fruits of the current round, empty before the first connection
    pub fruits: Vec<Fruit>,
    /// Problem text of the current round
    pub current_problem: Option<String>,
}

/// Result of judging a slice
#[derive(Debug, Clone, PartialEq)]
pub enum SliceOutcome {
    /// The correct fruit was cut and a new problem is already posed
    Correct {
        /// State right after scoring, status `correct`
        scored: Snapshot,
        /// The freshly generated round, status `waiting`
        next: Snapshot,
    },
    /// A decoy was cut
    Wrong(Snapshot),
}

impl SliceOutcome {
    /// Snapshots in the order they must reach the player
    pub fn into_snapshots(self) -> Vec<Snapshot> {
        match self {
            Self::Correct { scored, next } => vec![scored, next],
            Self::Wrong(snapshot) => vec![snapshot],
        }
    }
}

/// A game session shared by all of its players' connections
#[derive(Debug)]
pub struct GameSession {
    id: GameId,
    config: GameConfig,
    players: BTreeSet<PlayerId>,
    created_by: PlayerId,
    created_at: DateTime<Utc>,
    round: Option<Round>,
    status: Status,
    layout: Layout,
    rng: fastrand::Rng,
}

impl GameSession {
    /// Creates a session whose only player is its creator
    ///
    /// No problem is generated until the first connection.
    pub fn new(id: GameId, config: GameConfig, creator: PlayerId) -> Self {
        Self::with_rng(id, config, creator, fastrand::Rng::new())
    }

    /// Same as [`GameSession::new`] with a caller-provided random generator
    pub fn with_rng(id: GameId, config: GameConfig, creator: PlayerId, rng: fastrand::Rng) -> Self {
        Self {
            id,
            config,
            players: BTreeSet::from([creator.clone()]),
            created_by: creator,
            created_at: Utc::now(),
            round: None,
            status: Status::Waiting,
            layout: Layout::default(),
            rng,
        }
    }

    /// The session's identifier
    pub fn id(&self) -> GameId {
        self.id
    }

    /// The parameters the session was created with
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// Status of the last slice
    pub fn status(&self) -> Status {
        self.status
    }

    /// Whether the player is on the roster
    pub fn has_player(&self, player: &PlayerId) -> bool {
        self.players.contains(player)
    }

    /// Number of players on the roster
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Text of the current problem, if one was generated
    pub fn problem(&self) -> Option<&str> {
        self.round.as_ref().map(|round| round.prompt.as_str())
    }

    /// Answer that scores in the current round
    pub fn correct_answer(&self) -> Option<&Answer> {
        self.round.as_ref().map(|round| &round.answer)
    }

    /// Fruits of the current round
    pub fn fruits(&self) -> &[Fruit] {
        self.round
            .as_ref()
            .map(|round| round.fruits.as_slice())
            .unwrap_or_default()
    }

    /// Adds a player to the roster
    ///
    /// Joining twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SessionFull`] when the roster is at capacity.
    pub fn join(&mut self, player: PlayerId) -> Result<(), Error> {
        if self.players.contains(&player) {
            return Ok(());
        }
        if self.players.len() >= self.config.max_players {
            return Err(Error::SessionFull(self.config.max_players));
        }
        self.players.insert(player);
        Ok(())
    }

    /// Removes a player from the roster and reports whether it is now empty
    pub fn leave(&mut self, player: &PlayerId) -> bool {
        self.players.remove(player);
        self.players.is_empty()
    }

    /// Brings a player's connection up to date
    ///
    /// Generates the first problem if the session has none yet; later
    /// connections see the round as it is.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMember`] when the player is not on the roster.
    pub fn connect(&mut self, player: &PlayerId, scores: &ScoreBoard) -> Result<Snapshot, Error> {
        self.ensure_member(player)?;

        if self.round.is_none() {
            self.regenerate();
        }

        Ok(self.snapshot(scores.score(player)))
    }

    /// Judges a slice and applies the score change
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotMember`] for players off the roster and
    /// [`Error::NoActiveProblem`] before the first problem exists.
    pub fn slice(
        &mut self,
        player: &PlayerId,
        value: &Answer,
        scores: &ScoreBoard,
    ) -> Result<SliceOutcome, Error> {
        self.ensure_member(player)?;
        let round = self.round.as_mut().ok_or(Error::NoActiveProblem)?;

        if *value == round.answer {
            let score = scores.reward(player);
            self.status = Status::Correct;
            let scored = self.snapshot(score);

            self.regenerate();
            let next = self.snapshot(score);

            Ok(SliceOutcome::Correct { scored, next })
        } else {
            for fruit in &mut round.fruits {
                fruit.sliced = false;
            }
            let score = scores.penalize(player);
            self.status = Status::Wrong;

            Ok(SliceOutcome::Wrong(self.snapshot(score)))
        }
    }

    /// Listing view of the session
    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            game_type: self.config.game_type.clone(),
            status: self.status,
            players: self.players.iter().cloned().collect(),
            max_players: self.config.max_players,
            difficulty: self.config.difficulty,
            created_by: self.created_by.clone(),
            created_at: self.created_at,
            fruits: self.fruits().to_vec(),
            current_problem: self.problem().map(str::to_owned),
        }
    }

    fn ensure_member(&self, player: &PlayerId) -> Result<(), Error> {
        if self.has_player(player) {
            Ok(())
        } else {
            Err(Error::NotMember(player.clone()))
        }
    }

    fn regenerate(&mut self) {
        let problem = self.config.difficulty.generate(&mut self.rng);
        let fruits = self.layout.arrange(problem.candidates, &mut self.rng);

        debug!("{}: new {} problem {:?}", self.id, self.config.difficulty, problem.prompt);

        self.round = Some(Round {
            prompt: problem.prompt,
            answer: problem.answer,
            fruits,
        });
        self.status = Status::Waiting;
    }

    fn snapshot(&self, score: u64) -> Snapshot {
        Snapshot {
            problem: self.problem().unwrap_or_default().to_owned(),
            fruits: self.fruits().to_vec(),
            score,
            status: self.status,
            timestamp: Utc::now(),
        }
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn config(difficulty: Difficulty, max_players: usize) -> GameConfig {
        GameConfig {
            game_type: "math_fruit".to_owned(),
            difficulty,
            max_players,
        }
    }

    fn session(difficulty: Difficulty, max_players: usize) -> GameSession {
        GameSession::with_rng(
            GameId::from_str("game_12345").unwrap(),
            config(difficulty, max_players),
            PlayerId::from("student1"),
            fastrand::Rng::with_seed(21),
        )
    }

    fn decoy(session: &GameSession) -> Answer {
        let answer = session.correct_answer().unwrap();
        session
            .fruits()
            .iter()
            .map(|fruit| fruit.value.clone())
            .find(|value| value != answer)
            .unwrap_or_else(|| Answer::from("definitely wrong"))
    }

    #[test]
    fn test_new_session_has_no_problem() {
        let session = session(Difficulty::Elementary, 1);

        assert_eq!(session.status(), Status::Waiting);
        assert_eq!(session.problem(), None);
        assert!(session.fruits().is_empty());
        assert!(session.has_player(&PlayerId::from("student1")));
    }

    #[test]
    fn test_connect_generates_once() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::College, 1);

        let first = session.connect(&player, &scores).unwrap();
        let second = session.connect(&player, &scores).unwrap();

        assert_eq!(first.status, Status::Waiting);
        assert_eq!(first.problem, second.problem);
        assert_eq!(first.fruits, second.fruits);
        assert_eq!(first.fruits.len(), 3);
    }

    #[test]
    fn test_connect_rejects_stranger() {
        let scores = ScoreBoard::new();
        let mut session = session(Difficulty::Elementary, 2);
        let stranger = PlayerId::from("stranger");

        assert_eq!(
            session.connect(&stranger, &scores),
            Err(Error::NotMember(stranger))
        );
        assert_eq!(session.problem(), None);
    }

    #[test]
    fn test_fruits_hold_correct_answer() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");

        for difficulty in Difficulty::ALL {
            let mut session = session(difficulty, 1);
            session.connect(&player, &scores).unwrap();
            let answer = session.correct_answer().unwrap().clone();
            assert!(session.fruits().iter().any(|fruit| fruit.value == answer));
        }
    }

    #[test]
    fn test_correct_slice_scores_and_regenerates() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::Coding, 1);
        let before = session.connect(&player, &scores).unwrap();
        let answer = session.correct_answer().unwrap().clone();

        let outcome = session.slice(&player, &answer, &scores).unwrap();
        let SliceOutcome::Correct { scored, next } = outcome else {
            panic!("expected a correct outcome");
        };

        assert_eq!(scored.status, Status::Correct);
        assert_eq!(scored.score, 10);
        assert_eq!(scored.fruits, before.fruits);
        assert_eq!(next.status, Status::Waiting);
        assert_eq!(next.score, 10);
        assert_ne!(next.fruits, before.fruits);
        assert_eq!(session.status(), Status::Waiting);
        assert_eq!(scores.score(&player), 10);
    }

    #[test]
    fn test_wrong_slice_penalizes_and_keeps_problem() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::College, 1);
        let before = session.connect(&player, &scores).unwrap();

        scores.reward(&player);
        let outcome = session.slice(&player, &decoy(&session), &scores).unwrap();
        let snapshots = outcome.into_snapshots();

        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].status, Status::Wrong);
        assert_eq!(snapshots[0].score, 5);
        assert_eq!(snapshots[0].problem, before.problem);
        assert!(snapshots[0].fruits.iter().all(|fruit| !fruit.sliced));
    }

    #[test]
    fn test_wrong_slice_at_zero_stays_zero() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::College, 1);
        session.connect(&player, &scores).unwrap();

        let outcome = session.slice(&player, &Answer::from(-1), &scores).unwrap();
        assert!(matches!(outcome, SliceOutcome::Wrong(ref s) if s.score == 0));
    }

    #[test]
    fn test_wrong_slice_resets_sliced_flags() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::Elementary, 1);
        session.connect(&player, &scores).unwrap();
        if let Some(round) = session.round.as_mut() {
            round.fruits.iter_mut().for_each(|fruit| fruit.sliced = true);
        }

        session
            .slice(&player, &Answer::from("not a number"), &scores)
            .unwrap();

        assert!(session.fruits().iter().all(|fruit| !fruit.sliced));
    }

    #[test]
    fn test_numeric_string_does_not_match() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::Elementary, 1);
        session.connect(&player, &scores).unwrap();
        let Some(Answer::Numeric(n)) = session.correct_answer().cloned() else {
            panic!("elementary answers are numeric");
        };

        let outcome = session
            .slice(&player, &Answer::from(n.to_string()), &scores)
            .unwrap();
        assert!(matches!(outcome, SliceOutcome::Wrong(_)));
    }

    #[test]
    fn test_slice_before_connect() {
        let scores = ScoreBoard::new();
        let mut session = session(Difficulty::Elementary, 1);

        assert_eq!(
            session.slice(&PlayerId::from("student1"), &Answer::from(1), &scores),
            Err(Error::NoActiveProblem)
        );
    }

    #[test]
    fn test_join_respects_capacity() {
        let mut session = session(Difficulty::Elementary, 2);

        assert_eq!(session.join(PlayerId::from("student2")), Ok(()));
        assert_eq!(session.join(PlayerId::from("student2")), Ok(()));
        assert_eq!(
            session.join(PlayerId::from("student3")),
            Err(Error::SessionFull(2))
        );
        assert_eq!(session.player_count(), 2);
    }

    #[test]
    fn test_leave_reports_empty() {
        let mut session = session(Difficulty::Elementary, 2);
        session.join(PlayerId::from("student2")).unwrap();

        assert!(!session.leave(&PlayerId::from("student1")));
        assert!(session.leave(&PlayerId::from("student2")));
    }

    #[test]
    fn test_incoming_message_parse() {
        assert_eq!(
            IncomingMessage::parse(r#"{"type": "slice", "value": 5}"#).unwrap(),
            IncomingMessage::Slice {
                value: Answer::from(5)
            }
        );
        assert_eq!(
            IncomingMessage::parse(r#"{"type": "slice", "value": "0.5x^4"}"#).unwrap(),
            IncomingMessage::Slice {
                value: Answer::from("0.5x^4")
            }
        );
        assert!(IncomingMessage::parse(r#"{"value": 5}"#).is_err());
        assert!(IncomingMessage::parse(r#"{"type": "dice", "value": 5}"#).is_err());
        assert!(IncomingMessage::parse(r#"{"type": "slice"}"#).is_err());
        assert!(IncomingMessage::parse(r#"{"type": "slice", "value": [5]}"#).is_err());
        assert!(IncomingMessage::parse("not json").is_err());
    }

    #[test]
    fn test_snapshot_wire_format() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::Elementary, 1);
        let snapshot = session.connect(&player, &scores).unwrap();

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["status"], "waiting");
        assert_eq!(json["score"], 0);
        assert!(json["problem"].is_string());
        assert!(json["timestamp"].is_string());
        assert_eq!(json["fruits"].as_array().unwrap().len(), 3);
        assert_eq!(json["fruits"][0]["sliced"], false);
        assert!(json["fruits"][0]["value"].is_i64());
    }

    #[test]
    fn test_summary_before_and_after_first_round() {
        let scores = ScoreBoard::new();
        let player = PlayerId::from("student1");
        let mut session = session(Difficulty::Highschool, 3);

        let json = serde_json::to_value(session.summary()).unwrap();
        assert_eq!(json["type"], "math_fruit");
        assert_eq!(json["difficulty"], "highschool");
        assert_eq!(json["max_players"], 3);
        assert_eq!(json["players"][0], "student1");
        assert!(json.get("current_problem").is_none());

        session.connect(&player, &scores).unwrap();
        let summary = session.summary();
        assert!(summary.current_problem.is_some());
        assert_eq!(summary.fruits.len(), 3);
    }
}
