//! Caller identity
//!
//! Lobby operations take an opaque credential and turn it into a
//! [`PlayerId`] through an [`Authenticator`]. How credentials are minted is
//! up to the embedding server; [`TokenTable`] is a simple in-memory bearer
//! token store.

use std::{
    collections::HashMap,
    sync::{PoisonError, RwLock},
};

use thiserror::Error;

use super::{constants::auth::TOKEN_LENGTH, player::PlayerId};

/// Errors raised while authenticating
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The credential is unknown, revoked, or malformed
    #[error("Could not validate credentials")]
    InvalidCredentials,
}

/// Resolves credentials to player identities
pub trait Authenticator {
    /// Returns the player the credential belongs to
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] for anything it cannot vouch for.
    fn authenticate(&self, credential: &str) -> Result<PlayerId, Error>;
}

/// In-memory bearer tokens
#[derive(Debug, Default)]
pub struct TokenTable {
    tokens: RwLock<HashMap<String, PlayerId>>,
}

impl TokenTable {
    /// Creates an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Mints a fresh random token for a player
    pub fn issue(&self, player: PlayerId) -> String {
        let mut tokens = self.tokens.write().unwrap_or_else(PoisonError::into_inner);

        loop {
            let token: String = std::iter::repeat_with(fastrand::alphanumeric)
                .take(TOKEN_LENGTH)
                .collect();
            if !tokens.contains_key(&token) {
                tokens.insert(token.clone(), player);
                return token;
            }
        }
    }

    /// Invalidates a token, returning whom it belonged to
    pub fn revoke(&self, token: &str) -> Option<PlayerId> {
        self.tokens
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(token)
    }
}

impl Authenticator for TokenTable {
    /// Accepts the bare token or an `Authorization` header value
    fn authenticate(&self, credential: &str) -> Result<PlayerId, Error> {
        let token = credential
            .strip_prefix("Bearer ")
            .unwrap_or(credential)
            .trim();

        self.tokens
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(token)
            .cloned()
            .ok_or(Error::InvalidCredentials)
    }
}
