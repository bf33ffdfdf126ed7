//! In-memory room bus using per-ride member-connection sets.
//!
//! This implementation is suitable for:
//! - Single server deployments
//! - Development and testing
//!
//! Events are only delivered within a single process. Multiple server
//! replicas will NOT see each other's rooms; use a shared pub/sub backend
//! for that.
//!
//! Join, leave and broadcast for one ride are serialized through the room's
//! map entry; rooms are independent of each other. A room entry is dropped
//! when its last member leaves so the registry stays bounded by the number
//! of rides with live listeners.

use async_trait::async_trait;
use dashmap::DashMap;
use std::collections::{HashMap, HashSet};

use campool_events::{Connection, ConnectionId, NewMessageEvent, RoomBus, RoomBusError};
use campool_storage::RideId;

/// In-memory room registry: ride id -> member connections.
pub struct MemoryRoomBus {
    rooms: DashMap<RideId, HashMap<ConnectionId, Connection>>,
    /// Reverse index so a disconnect can leave every joined room.
    memberships: DashMap<ConnectionId, HashSet<RideId>>,
}

impl MemoryRoomBus {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Number of connections currently in a ride's room.
    pub fn room_size(&self, ride_id: &RideId) -> usize {
        self.rooms.get(ride_id).map(|r| r.len()).unwrap_or(0)
    }

    /// Number of rooms with at least one member.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }

    fn remove_member(&self, ride_id: &RideId, connection_id: &ConnectionId) {
        if let Some(mut room) = self.rooms.get_mut(ride_id) {
            room.remove(connection_id);
        }
        self.rooms.remove_if(ride_id, |_, room| room.is_empty());
    }
}

impl Default for MemoryRoomBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RoomBus for MemoryRoomBus {
    async fn join(&self, ride_id: &RideId, connection: Connection) -> Result<(), RoomBusError> {
        self.memberships
            .entry(connection.id)
            .or_default()
            .insert(*ride_id);
        self.rooms
            .entry(*ride_id)
            .or_default()
            .insert(connection.id, connection);
        Ok(())
    }

    async fn leave(
        &self,
        ride_id: &RideId,
        connection_id: &ConnectionId,
    ) -> Result<(), RoomBusError> {
        self.remove_member(ride_id, connection_id);
        if let Some(mut joined) = self.memberships.get_mut(connection_id) {
            joined.remove(ride_id);
        }
        self.memberships
            .remove_if(connection_id, |_, joined| joined.is_empty());
        Ok(())
    }

    async fn disconnect(&self, connection_id: &ConnectionId) -> Result<(), RoomBusError> {
        if let Some((_, joined)) = self.memberships.remove(connection_id) {
            for ride_id in joined {
                self.remove_member(&ride_id, connection_id);
            }
        }
        Ok(())
    }

    async fn broadcast(
        &self,
        ride_id: &RideId,
        event: NewMessageEvent,
    ) -> Result<(), RoomBusError> {
        let mut dead: Vec<ConnectionId> = vec![];
        if let Some(room) = self.rooms.get(ride_id) {
            for (id, connection) in room.iter() {
                if !connection.deliver(event.clone()) {
                    dead.push(*id);
                }
            }
        }
        // Prune connections whose receiving side is gone.
        for id in dead {
            self.leave(ride_id, &id).await?;
        }
        Ok(())
    }
}
