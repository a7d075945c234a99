//! Live session bookkeeping
//!
//! The registry maps game ids to sessions. Each session sits behind its own
//! mutex so that at most one transition runs on it at a time, whichever
//! connection triggered it. The map lock is always taken before a session
//! lock, never the other way around.

use std::{
    collections::{BTreeMap, HashMap, hash_map::Entry},
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use garde::Validate;
use log::info;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{
    constants::session as limits,
    game::{self, GameConfig, GameSession, SessionSummary, Snapshot},
    game_id::GameId,
    player::PlayerId,
    problem::{self, Difficulty},
    scoreboard::ScoreBoard,
};

/// Parameters for creating a session, as received from a client
///
/// Omitted fields fall back to a single-player elementary game.
#[derive(Debug, Clone, Deserialize, Serialize, Validate)]
pub struct SessionRequest {
    /// Free-form label for the kind of game
    #[serde(default = "default_game_type")]
    #[garde(length(chars, min = 1, max = limits::MAX_GAME_TYPE_LENGTH))]
    pub game_type: String,
    /// Roster capacity
    #[serde(default = "default_max_players")]
    #[garde(range(min = limits::MIN_PLAYERS, max = limits::MAX_PLAYERS))]
    pub max_players: usize,
    /// Name of the difficulty tier
    #[serde(default = "default_difficulty")]
    #[garde(skip)]
    pub difficulty: String,
}

fn default_game_type() -> String {
    limits::DEFAULT_GAME_TYPE.to_owned()
}

fn default_max_players() -> usize {
    limits::DEFAULT_MAX_PLAYERS
}

fn default_difficulty() -> String {
    Difficulty::Elementary.as_str().to_owned()
}

impl Default for SessionRequest {
    fn default() -> Self {
        Self {
            game_type: default_game_type(),
            max_players: default_max_players(),
            difficulty: default_difficulty(),
        }
    }
}

impl SessionRequest {
    /// A request for the given tier with the other fields defaulted
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        Self {
            difficulty: difficulty.as_str().to_owned(),
            ..Self::default()
        }
    }

    /// Validates the request and resolves the difficulty tier
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::Invalid`] for out-of-range fields and
    /// [`ConfigurationError::Difficulty`] for unrecognised tiers.
    pub fn into_config(self) -> Result<GameConfig, ConfigurationError> {
        self.validate()?;
        let difficulty = self.difficulty.parse()?;

        Ok(GameConfig {
            game_type: self.game_type,
            difficulty,
            max_players: self.max_players,
        })
    }
}

/// Reasons a creation request is rejected
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A field is out of range
    #[error(transparent)]
    Invalid(#[from] garde::Report),
    /// The difficulty names no known tier
    #[error(transparent)]
    Difficulty(#[from] problem::Error),
}

/// Errors raised by registry operations
#[derive(Error, Debug)]
pub enum Error {
    /// No session with this id exists
    #[error("Game not found")]
    NotFound(GameId),
    /// The session rejected the operation
    #[error(transparent)]
    Game(#[from] game::Error),
    /// The creation request is malformed
    #[error("invalid session request: {0}")]
    Configuration(#[from] ConfigurationError),
    /// Every session slot is taken
    #[error("too many active games")]
    Capacity,
}

/// All sessions currently alive
#[derive(Debug, Clone, Serialize)]
pub struct SessionListing {
    /// Sessions by id
    pub games: BTreeMap<GameId, SessionSummary>,
    /// Number of sessions
    pub total_games: usize,
}

/// A session as shared between connections
pub type SharedSession = Arc<Mutex<GameSession>>;

/// Locks a session, recovering the data if a previous holder panicked
pub fn lock(session: &Mutex<GameSession>) -> MutexGuard<'_, GameSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-wide mapping from game id to session
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<GameId, SharedSession>>,
}

impl SessionRegistry {
    /// Creates an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a request and registers a new session owned by `creator`
    ///
    /// # Errors
    ///
    /// Configuration errors leave the registry untouched; see
    /// [`SessionRequest::into_config`]. Returns [`Error::Capacity`] when the
    /// registry is full.
    pub fn create(
        &self,
        request: SessionRequest,
        creator: PlayerId,
    ) -> Result<(GameId, SessionSummary), Error> {
        let config = request.into_config()?;

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        if sessions.len() >= limits::MAX_SESSION_COUNT {
            return Err(Error::Capacity);
        }

        loop {
            let id = GameId::new();
            if let Entry::Vacant(entry) = sessions.entry(id) {
                info!(
                    "{id}: created by {creator} ({}, up to {} players)",
                    config.difficulty, config.max_players
                );
                let session = GameSession::new(id, config, creator);
                let summary = session.summary();
                entry.insert(Arc::new(Mutex::new(session)));
                return Ok((id, summary));
            }
        }
    }

    /// Looks up a session
    pub fn get(&self, id: &GameId) -> Option<SharedSession> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Whether a session with this id is alive
    pub fn contains(&self, id: &GameId) -> bool {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    /// Number of live sessions
    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether no session is alive
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Adds a player to a session's roster
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown sessions and
    /// [`game::Error::SessionFull`] when the roster is at capacity.
    pub fn join(&self, id: &GameId, player: PlayerId) -> Result<(), Error> {
        let session = self.get(id).ok_or(Error::NotFound(*id))?;
        lock(&session).join(player)?;
        Ok(())
    }

    /// Validates a connecting player and returns the session with the
    /// snapshot to send first
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for unknown sessions and
    /// [`game::Error::NotMember`] for players off the roster.
    pub fn connect(
        &self,
        id: &GameId,
        player: &PlayerId,
        scores: &ScoreBoard,
    ) -> Result<(SharedSession, Snapshot), Error> {
        let session = self.get(id).ok_or(Error::NotFound(*id))?;
        let snapshot = lock(&session).connect(player, scores)?;
        Ok((session, snapshot))
    }

    /// Removes a player from a session, destroying the session when its
    /// roster becomes empty
    ///
    /// The session is identified by the handle a connection holds, not by
    /// id: once a session is gone its id may be handed out again, and a
    /// late departure must not touch the newcomer.
    ///
    /// Returns whether the session was destroyed.
    pub fn leave(&self, session: &SharedSession, player: &PlayerId) -> bool {
        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        let mut state = lock(session);
        let id = state.id();

        let registered = sessions
            .get(&id)
            .is_some_and(|current| Arc::ptr_eq(current, session));
        if !state.leave(player) || !registered {
            return false;
        }

        drop(state);
        sessions.remove(&id);
        info!("{id}: last player {player} left, session closed");
        true
    }

    /// Snapshot of every live session
    pub fn list(&self) -> SessionListing {
        let sessions = self.sessions.read().unwrap_or_else(PoisonError::into_inner);

        let games: BTreeMap<_, _> = sessions
            .iter()
            .map(|(id, session)| (*id, lock(session).summary()))
            .collect();

        SessionListing {
            total_games: games.len(),
            games,
        }
    }
}
