//! Communication session management
//!
//! This module defines the trait for tunneling messages between a game
//! session and one connected player. The tunnel abstraction lets the
//! connection loop run over WebSockets, in-process channels, or anything
//! else that carries text frames in both directions.

use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use super::OutgoingMessage;

/// The peer is gone and nothing more can be sent
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("connection closed")]
pub struct Closed;

/// Trait for exchanging messages with one connected client
///
/// Implementations might use WebSockets, Server-Sent Events paired with
/// HTTP posts, or other bidirectional transports.
pub trait Tunnel: Send {
    /// Sends a message to the client
    ///
    /// # Arguments
    ///
    /// * `message` - The message to send
    ///
    /// # Errors
    ///
    /// Returns [`Closed`] once the client can no longer be reached.
    fn send_message(
        &mut self,
        message: &OutgoingMessage,
    ) -> impl Future<Output = Result<(), Closed>> + Send;

    /// Waits for the next text frame from the client
    ///
    /// Resolves to `None` when the client has disconnected.
    fn receive_message(&mut self) -> impl Future<Output = Option<String>> + Send;

    /// Closes the communication tunnel
    ///
    /// This method should be called when the client disconnects or
    /// when the communication is no longer needed.
    fn close(self) -> impl Future<Output = ()> + Send;
}

/// Server side of an in-process tunnel
///
/// Messages are serialized to text before they cross the channel so the
/// client end sees exactly what a network client would.
#[derive(Debug)]
pub struct ChannelTunnel {
    outgoing: UnboundedSender<String>,
    incoming: UnboundedReceiver<String>,
}

/// Client side of an in-process tunnel
#[derive(Debug)]
pub struct ClientEnd {
    outgoing: Option<UnboundedSender<String>>,
    incoming: UnboundedReceiver<String>,
}

/// Creates a connected tunnel and client pair
pub fn channel() -> (ChannelTunnel, ClientEnd) {
    let (to_client, from_server) = mpsc::unbounded_channel();
    let (to_server, from_client) = mpsc::unbounded_channel();

    (
        ChannelTunnel {
            outgoing: to_client,
            incoming: from_client,
        },
        ClientEnd {
            outgoing: Some(to_server),
            incoming: from_server,
        },
    )
}

impl Tunnel for ChannelTunnel {
    async fn send_message(&mut self, message: &OutgoingMessage) -> Result<(), Closed> {
        self.outgoing
            .send(message.to_message())
            .map_err(|_| Closed)
    }

    async fn receive_message(&mut self) -> Option<String> {
        self.incoming.recv().await
    }

    async fn close(self) {}
}

impl ClientEnd {
    /// Sends a raw text frame to the server
    ///
    /// # Errors
    ///
    /// Returns [`Closed`] after [`ClientEnd::hang_up`] or once the server
    /// side has been dropped.
    pub fn send(&self, text: impl Into<String>) -> Result<(), Closed> {
        self.outgoing
            .as_ref()
            .ok_or(Closed)?
            .send(text.into())
            .map_err(|_| Closed)
    }

    /// Waits for the next text frame from the server
    ///
    /// Returns `None` once the server has closed the tunnel and every
    /// pending frame has been read.
    pub async fn recv(&mut self) -> Option<String> {
        self.incoming.recv().await
    }

    /// Waits for the next frame and parses it as JSON
    pub async fn recv_json(&mut self) -> Option<serde_json::Value> {
        let text = self.recv().await?;
        serde_json::from_str(&text).ok()
    }

    /// Stops sending while still reading whatever the server sends back
    pub fn hang_up(&mut self) {
        self.outgoing = None;
    }
}
