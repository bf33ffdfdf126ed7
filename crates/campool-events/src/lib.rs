//! Room abstraction for campool realtime chat delivery.
//!
//! This crate defines the `RoomBus` trait that allows different
//! implementations for fanning out new-message events to connected clients:
//! - Memory (single server, per-ride member sets over tokio channels)
//! - Redis or similar pub/sub for multi-replica deployments
//!
//! A room groups the connections currently authorized to receive events for
//! one ride. Authorization is established by the service at join time; the
//! bus itself only tracks membership and delivers events.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::Stream;
use serde::{Deserialize, Serialize};
use std::pin::Pin;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use uuid::Uuid;

use campool_storage::{RideId, UserId};

/// How many undelivered events a single connection may buffer before new
/// events for it are dropped (slow consumer).
pub const CONNECTION_BUFFER: usize = 100;

/// Identifier for one realtime connection (socket/session).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ConnectionId(pub Uuid);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

/// Event delivered to room members when a message is appended to a ride's
/// chat thread. Ciphertext is opaque to the server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewMessageEvent {
    pub ride_id: RideId,
    pub sender_id: UserId,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    pub sent_at: DateTime<Utc>,
}

/// Error type for room bus operations
#[derive(Debug, Error)]
pub enum RoomBusError {
    #[error("backend error: {0}")]
    Backend(String),
}

/// Stream of new-message events for one connection.
pub type EventStream = Pin<Box<dyn Stream<Item = NewMessageEvent> + Send>>;

/// One realtime connection's sending half, handed to the bus at join time.
///
/// The transport keeps the paired [`EventStream`] and forwards everything it
/// yields to the client. Dropping the stream closes the channel; the bus
/// prunes closed connections on the next broadcast that reaches them.
#[derive(Clone, Debug)]
pub struct Connection {
    pub id: ConnectionId,
    sender: mpsc::Sender<NewMessageEvent>,
}

impl Connection {
    /// Create a connection and the event stream its transport will drain.
    pub fn pair() -> (Self, EventStream) {
        let (tx, rx) = mpsc::channel(CONNECTION_BUFFER);
        (
            Self {
                id: ConnectionId::new(),
                sender: tx,
            },
            Box::pin(ReceiverStream::new(rx)),
        )
    }

    /// Non-blocking delivery; returns false once the receiving side is gone.
    /// A full buffer drops the event (slow client, should resync).
    pub fn deliver(&self, event: NewMessageEvent) -> bool {
        match self.sender.try_send(event) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(_)) => true,
            Err(mpsc::error::TrySendError::Closed(_)) => false,
        }
    }
}

/// Room bus trait for realtime membership and fanout.
///
/// The service re-derives chat authorization from the live ride before
/// calling `join`; implementations trust the membership established there
/// and do not re-check it per broadcast.
#[async_trait]
pub trait RoomBus: Send + Sync {
    /// Add a connection to a ride's room.
    async fn join(&self, ride_id: &RideId, connection: Connection) -> Result<(), RoomBusError>;

    /// Remove a connection from one room.
    async fn leave(
        &self,
        ride_id: &RideId,
        connection_id: &ConnectionId,
    ) -> Result<(), RoomBusError>;

    /// Remove a connection from every room it joined (transport disconnect).
    async fn disconnect(&self, connection_id: &ConnectionId) -> Result<(), RoomBusError>;

    /// Deliver an event to every connection currently in the ride's room.
    async fn broadcast(&self, ride_id: &RideId, event: NewMessageEvent)
        -> Result<(), RoomBusError>;
}
