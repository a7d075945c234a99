//! Per-player connection loop
//!
//! A [`ConnectionHandler`] owns one player's tunnel for as long as it stays
//! open. It validates the player, sends the current view of the session,
//! then turns every incoming frame into a slice attempt and every outcome
//! into snapshots sent back to that same player. However the loop ends, the
//! player is removed from the session exactly once.

use std::sync::{Arc, Mutex};

use itertools::Itertools;
use log::{debug, info, warn};
use thiserror::Error;

use super::{
    OutgoingMessage,
    game::{self, GameSession, IncomingMessage},
    game_id::GameId,
    player::PlayerId,
    registry::{self, SessionRegistry, SharedSession},
    scoreboard::ScoreBoard,
    session::Tunnel,
};

/// Errors raised while processing a single client frame
///
/// None of these end the connection.
#[derive(Error, Debug)]
pub enum Error {
    /// The frame is not a recognised message
    #[error("{0}")]
    Malformed(#[from] serde_json::Error),
    /// The session rejected the slice
    #[error(transparent)]
    Game(#[from] game::Error),
}

/// Drives one player's connection to one session
#[derive(Debug)]
pub struct ConnectionHandler {
    sessions: Arc<SessionRegistry>,
    scores: Arc<ScoreBoard>,
    game_id: GameId,
    player: PlayerId,
}

/// Removes the player from the session when dropped
struct Departure<'a> {
    sessions: &'a SessionRegistry,
    session: &'a SharedSession,
    game_id: GameId,
    player: &'a PlayerId,
}

impl Drop for Departure<'_> {
    fn drop(&mut self) {
        let destroyed = self.sessions.leave(self.session, self.player);
        info!(
            "{}: {} disconnected{}",
            self.game_id,
            self.player,
            if destroyed { ", session removed" } else { "" }
        );
    }
}

impl ConnectionHandler {
    /// Creates a handler for `player` connecting to `game_id`
    ///
    /// Nothing is checked until [`ConnectionHandler::run`].
    pub fn new(
        sessions: Arc<SessionRegistry>,
        scores: Arc<ScoreBoard>,
        game_id: GameId,
        player: PlayerId,
    ) -> Self {
        Self {
            sessions,
            scores,
            game_id,
            player,
        }
    }

    /// The session this handler connects to
    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    /// The connecting player
    pub fn player(&self) -> &PlayerId {
        &self.player
    }

    /// Runs the connection until the client disconnects or can no longer be
    /// reached, then closes the tunnel
    ///
    /// Unknown sessions and players off the roster get a single error
    /// message and the tunnel is closed without touching the session.
    pub async fn run<T: Tunnel>(self, mut tunnel: T) {
        let connected = self
            .sessions
            .connect(&self.game_id, &self.player, &self.scores)
            .map_err(|e| {
                warn!("{}: rejected {}: {e}", self.game_id, self.player);
                OutgoingMessage::error(e)
            });

        let (session, snapshot) = match connected {
            Ok(connected) => connected,
            Err(rejection) => {
                if tunnel.send_message(&rejection).await.is_err() {
                    debug!("{}: {} left before the rejection", self.game_id, self.player);
                }
                tunnel.close().await;
                return;
            }
        };

        let departure = Departure {
            sessions: &self.sessions,
            session: &session,
            game_id: self.game_id,
            player: &self.player,
        };
        info!("{}: {} connected", self.game_id, self.player);

        if tunnel.send_message(&snapshot.into()).await.is_ok() {
            self.event_loop(&session, &mut tunnel).await;
        }

        drop(departure);
        tunnel.close().await;
    }

    async fn event_loop<T: Tunnel>(&self, session: &Mutex<GameSession>, tunnel: &mut T) {
        while let Some(text) = tunnel.receive_message().await {
            let replies = match self.handle(session, &text) {
                Ok(snapshots) => snapshots
                    .into_iter()
                    .map(OutgoingMessage::from)
                    .collect_vec(),
                Err(e) => {
                    debug!("{}: {} sent {text:?}: {e}", self.game_id, self.player);
                    vec![OutgoingMessage::error(format!("Processing error: {e}"))]
                }
            };

            for reply in &replies {
                if tunnel.send_message(reply).await.is_err() {
                    return;
                }
            }
        }
    }

    fn handle(&self, session: &Mutex<GameSession>, text: &str) -> Result<Vec<game::Snapshot>, Error> {
        let IncomingMessage::Slice { value } = IncomingMessage::parse(text)?;

        let outcome = registry::lock(session).slice(&self.player, &value, &self.scores)?;
        if let game::SliceOutcome::Correct { scored, .. } = &outcome {
            info!(
                "{}: {} sliced the answer, score {}",
                self.game_id, self.player, scored.score
            );
        }

        Ok(outcome.into_snapshots())
    }
}
