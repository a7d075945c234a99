//! Authenticated entry points
//!
//! The lobby is what an HTTP layer would sit on: every operation takes the
//! caller's credential, resolves it to a player, and forwards to the shared
//! registry and score board. Live connections are handed out as
//! [`ConnectionHandler`]s, which trust the player id they are given.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use super::{
    TruncatedVec,
    auth::{self, Authenticator},
    connection::ConnectionHandler,
    game::SessionSummary,
    game_id::GameId,
    player::PlayerId,
    registry::{self, SessionListing, SessionRegistry, SessionRequest},
    scoreboard::{ScoreBoard, Standing},
};

/// Errors raised by lobby operations
#[derive(Error, Debug)]
pub enum Error {
    /// The credential was rejected
    #[error(transparent)]
    Unauthorized(#[from] auth::Error),
    /// The registry rejected the operation
    #[error(transparent)]
    Session(#[from] registry::Error),
}

/// Reply to a successful session creation
#[derive(Debug, Clone, Serialize)]
pub struct Created {
    /// Identifier of the new session
    pub game_id: GameId,
    /// The new session as it would appear in a listing
    pub game: SessionSummary,
}

/// Shared state behind the game's request handlers
#[derive(Debug)]
pub struct Lobby<A> {
    auth: A,
    sessions: Arc<SessionRegistry>,
    scores: Arc<ScoreBoard>,
}

impl<A: Authenticator> Lobby<A> {
    /// Creates a lobby with an empty registry and score board
    pub fn new(auth: A) -> Self {
        Self::with_stores(
            auth,
            Arc::new(SessionRegistry::new()),
            Arc::new(ScoreBoard::new()),
        )
    }

    /// Creates a lobby over existing stores
    pub fn with_stores(auth: A, sessions: Arc<SessionRegistry>, scores: Arc<ScoreBoard>) -> Self {
        Self {
            auth,
            sessions,
            scores,
        }
    }

    /// The authenticator in use
    pub fn authenticator(&self) -> &A {
        &self.auth
    }

    /// The session registry
    pub fn sessions(&self) -> &Arc<SessionRegistry> {
        &self.sessions
    }

    /// The score board
    pub fn scores(&self) -> &Arc<ScoreBoard> {
        &self.scores
    }

    /// Creates a session owned by the caller
    ///
    /// The caller gets a score board entry if they had none; an existing
    /// score is left alone.
    pub fn create_session(&self, credential: &str, request: SessionRequest) -> Result<Created, Error> {
        let player = self.auth.authenticate(credential)?;
        self.scores.ensure(&player);

        let (game_id, game) = self.sessions.create(request, player)?;
        Ok(Created { game_id, game })
    }

    /// Lists every live session
    pub fn list_sessions(&self, credential: &str) -> Result<SessionListing, Error> {
        self.auth.authenticate(credential)?;
        Ok(self.sessions.list())
    }

    /// Adds the caller to an existing session
    pub fn join_session(&self, credential: &str, game_id: &GameId) -> Result<(), Error> {
        let player = self.auth.authenticate(credential)?;

        self.sessions.join(game_id, player.clone())?;
        self.scores.ensure(&player);
        Ok(())
    }

    /// Top scores across all players
    pub fn leaderboard(&self, credential: &str, limit: usize) -> Result<TruncatedVec<Standing>, Error> {
        self.auth.authenticate(credential)?;
        Ok(self.scores.standings(limit))
    }

    /// A connection loop for `player` on `game_id`, ready to run over a
    /// tunnel
    pub fn connection(&self, game_id: GameId, player: PlayerId) -> ConnectionHandler {
        ConnectionHandler::new(self.sessions.clone(), self.scores.clone(), game_id, player)
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use crate::{
        auth::TokenTable,
        game,
        problem::Difficulty,
        session,
    };

    fn lobby() -> (Lobby<TokenTable>, String, String) {
        let tokens = TokenTable::new();
        let first = tokens.issue(PlayerId::from("student1"));
        let second = tokens.issue(PlayerId::from("student2"));
        (Lobby::new(tokens), first, second)
    }

    #[test]
    fn test_operations_require_credentials() {
        let (lobby, _, _) = lobby();

        assert!(matches!(
            lobby.create_session("bogus", SessionRequest::default()),
            Err(Error::Unauthorized(auth::Error::InvalidCredentials))
        ));
        assert!(matches!(
            lobby.list_sessions("bogus"),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            lobby.join_session("bogus", &GameId::new()),
            Err(Error::Unauthorized(_))
        ));
        assert!(matches!(
            lobby.leaderboard("bogus", 10),
            Err(Error::Unauthorized(_))
        ));
        assert!(lobby.sessions().is_empty());
    }

    #[test]
    fn test_create_and_list() {
        let (lobby, token, _) = lobby();

        let created = lobby
            .create_session(&token, SessionRequest::for_difficulty(Difficulty::Coding))
            .unwrap();
        assert_eq!(created.game.created_by, PlayerId::from("student1"));
        assert_eq!(created.game.difficulty, Difficulty::Coding);

        let json = serde_json::to_value(&created).unwrap();
        assert_eq!(json["game_id"], created.game_id.to_string());
        assert_eq!(json["game"]["type"], "math_fruit");
        assert_eq!(json["game"]["status"], "waiting");

        let listing = lobby.list_sessions(&token).unwrap();
        assert_eq!(listing.total_games, 1);
        assert!(listing.games.contains_key(&created.game_id));
    }

    #[test]
    fn test_create_registers_score_without_reset() {
        let (lobby, token, _) = lobby();
        let player = PlayerId::from("student1");
        lobby.scores().reward(&player);

        lobby
            .create_session(&token, SessionRequest::default())
            .unwrap();
        assert_eq!(lobby.scores().score(&player), 10);

        let standings = lobby.leaderboard(&token, 10).unwrap();
        assert_eq!(standings.exact_count(), 1);
        assert_eq!(standings.items()[0].points, 10);
    }

    #[test]
    fn test_create_rejects_bad_config() {
        let (lobby, token, _) = lobby();
        let request = SessionRequest {
            difficulty: "impossible".to_owned(),
            ..SessionRequest::default()
        };

        let error = lobby.create_session(&token, request).unwrap_err();
        assert!(matches!(
            error,
            Error::Session(registry::Error::Configuration(_))
        ));
        assert!(lobby.sessions().is_empty());
    }

    #[test]
    fn test_join_session() {
        let (lobby, first, second) = lobby();
        let request = SessionRequest {
            max_players: 2,
            ..SessionRequest::default()
        };
        let created = lobby.create_session(&first, request).unwrap();

        lobby.join_session(&second, &created.game_id).unwrap();
        let listing = lobby.list_sessions(&second).unwrap();
        assert_eq!(
            listing.games[&created.game_id].players,
            vec![PlayerId::from("student1"), PlayerId::from("student2")]
        );

        let full = lobby.create_session(&first, SessionRequest::default()).unwrap();
        assert!(matches!(
            lobby.join_session(&second, &full.game_id),
            Err(Error::Session(registry::Error::Game(game::Error::SessionFull(1))))
        ));
    }

    #[tokio::test]
    async fn test_connection_plays_a_round() {
        let (lobby, token, _) = lobby();
        let created = lobby
            .create_session(&token, SessionRequest::default())
            .unwrap();

        let (tunnel, mut client) = session::channel();
        let handler = lobby.connection(created.game_id, PlayerId::from("student1"));
        let handle = tokio::spawn(handler.run(tunnel));

        let snapshot = client.recv_json().await.unwrap();
        let session = lobby.sessions().get(&created.game_id).unwrap();
        let answer = registry::lock(&session).correct_answer().unwrap().clone();
        assert_eq!(snapshot["fruits"].as_array().unwrap().len(), 3);

        client
            .send(serde_json::json!({"type": "slice", "value": answer}).to_string())
            .unwrap();
        assert_eq!(client.recv_json().await.unwrap()["status"], "correct");
        assert_eq!(client.recv_json().await.unwrap()["status"], "waiting");

        client.hang_up();
        handle.await.unwrap();

        assert!(lobby.list_sessions(&token).unwrap().games.is_empty());
        let standings = lobby.leaderboard(&token, 1).unwrap();
        assert_eq!(standings.items()[0].points, 10);
    }

    #[tokio::test]
    async fn test_connection_to_missing_game() {
        let (lobby, _, _) = lobby();
        let (tunnel, mut client) = session::channel();

        lobby
            .connection(GameId::new(), PlayerId::from("student1"))
            .run(tunnel)
            .await;

        assert_eq!(client.recv_json().await.unwrap()["error"], "Game not found");
        assert!(client.recv().await.is_none());
    }
}
