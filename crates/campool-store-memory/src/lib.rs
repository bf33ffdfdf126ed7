//! In-memory store backend for campool.
//!
//! This implementation is suitable for:
//! - Single server deployments
//! - Development and testing
//!
//! Ride records carry a version counter bumped on every write; conditional
//! updates compare against it under the map's per-entry lock, which gives
//! the same atomic compare-and-swap contract a database backend provides
//! with a transactional `WHERE version = ?` update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use campool_storage::{
    ChatMessage, ChatStore, ChatThread, CreateRideParams, InstitutionId, Ride, RideId, RideStore,
    RideStatus, StoreError, UserId, VersionedRide,
};

struct VersionedEntry {
    version: u64,
    ride: Ride,
}

/// In-memory implementation of both store traits.
pub struct MemoryStore {
    rides: DashMap<RideId, VersionedEntry>,
    threads: DashMap<RideId, ChatThread>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            rides: DashMap::new(),
            threads: DashMap::new(),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RideStore for MemoryStore {
    async fn create_ride(&self, params: &CreateRideParams) -> Result<Ride, StoreError> {
        let now = Utc::now();
        let ride = Ride {
            id: RideId::new(),
            creator_id: params.creator_id,
            creator_institution_id: params.creator_institution_id,
            available_seats: params.available_seats,
            preferred_gender: params.preferred_gender,
            luggage_space: params.luggage_space,
            destination: params.destination.clone(),
            scheduled_at: params.scheduled_at,
            allow_chat: params.allow_chat,
            requests: vec![],
            confirmed_users: vec![],
            status: RideStatus::Open,
            expires_at: params.expires_at,
            created_at: now,
            updated_at: now,
        };
        self.rides.insert(
            ride.id,
            VersionedEntry {
                version: 1,
                ride: ride.clone(),
            },
        );
        Ok(ride)
    }

    async fn get_ride(&self, ride_id: &RideId) -> Result<VersionedRide, StoreError> {
        self.rides
            .get(ride_id)
            .map(|e| VersionedRide {
                ride: e.ride.clone(),
                version: e.version,
            })
            .ok_or(StoreError::NotFound)
    }

    async fn update_ride(
        &self,
        ride_id: &RideId,
        expected_version: u64,
        mut ride: Ride,
    ) -> Result<Ride, StoreError> {
        let mut entry = self.rides.get_mut(ride_id).ok_or(StoreError::NotFound)?;
        if entry.version != expected_version {
            return Err(StoreError::Conflict);
        }
        ride.updated_at = Utc::now();
        entry.version += 1;
        entry.ride = ride.clone();
        Ok(ride)
    }

    async fn list_by_institution(
        &self,
        institution_id: &InstitutionId,
        statuses: &[RideStatus],
        min_scheduled_at: DateTime<Utc>,
    ) -> Result<Vec<Ride>, StoreError> {
        let mut rides: Vec<Ride> = self
            .rides
            .iter()
            .filter(|e| {
                e.ride.creator_institution_id == *institution_id
                    && statuses.contains(&e.ride.status)
                    && e.ride.scheduled_at >= min_scheduled_at
            })
            .map(|e| e.ride.clone())
            .collect();
        rides.sort_by_key(|r| r.scheduled_at);
        Ok(rides)
    }

    async fn delete_expired_rides(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.rides.len();
        self.rides.retain(|_, e| e.ride.expires_at > now);
        Ok((before - self.rides.len()) as u64)
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn get_thread(&self, ride_id: &RideId) -> Result<ChatThread, StoreError> {
        self.threads
            .get(ride_id)
            .map(|t| t.clone())
            .ok_or(StoreError::NotFound)
    }

    async fn create_thread(
        &self,
        ride_id: &RideId,
        participants: &[UserId],
        expires_at: DateTime<Utc>,
    ) -> Result<ChatThread, StoreError> {
        if self.threads.contains_key(ride_id) {
            return Err(StoreError::AlreadyExists);
        }
        let now = Utc::now();
        let thread = ChatThread {
            ride_id: *ride_id,
            participants: participants.to_vec(),
            messages: vec![],
            expires_at,
            created_at: now,
            updated_at: now,
        };
        self.threads.insert(*ride_id, thread.clone());
        Ok(thread)
    }

    async fn refresh_thread(
        &self,
        ride_id: &RideId,
        participants: &[UserId],
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut thread = self.threads.get_mut(ride_id).ok_or(StoreError::NotFound)?;
        thread.participants = participants.to_vec();
        thread.expires_at = expires_at;
        thread.updated_at = Utc::now();
        Ok(())
    }

    async fn append_message(
        &self,
        ride_id: &RideId,
        sender_id: &UserId,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<ChatMessage, StoreError> {
        let mut thread = self.threads.get_mut(ride_id).ok_or(StoreError::NotFound)?;

        // Server-assigned timestamp, clamped so timestamps never go backwards
        // within a thread.
        let mut sent_at = Utc::now();
        if let Some(last) = thread.messages.last() {
            if last.sent_at > sent_at {
                sent_at = last.sent_at;
            }
        }

        let message = ChatMessage {
            sender_id: *sender_id,
            ciphertext: ciphertext.to_vec(),
            nonce: nonce.to_vec(),
            sent_at,
        };
        thread.messages.push(message.clone());
        thread.updated_at = sent_at;
        Ok(message)
    }

    async fn delete_expired_threads(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let before = self.threads.len();
        self.threads.retain(|_, t| t.expires_at > now);
        Ok((before - self.threads.len()) as u64)
    }
}
