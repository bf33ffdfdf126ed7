//! The store traits that backends implement.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::types::*;
use crate::StoreError;

/// A ride record together with the store's version counter for that record,
/// used as the expected-version token in conditional updates.
#[derive(Clone, Debug)]
pub struct VersionedRide {
    pub ride: Ride,
    pub version: u64,
}

/// Ride persistence.
///
/// Every mutation of an existing ride goes through `update_ride`, a
/// compare-and-swap on the record version: the write applies only if the
/// record has not changed since the caller read it, otherwise
/// `StoreError::Conflict` and the caller re-reads and re-checks its
/// preconditions. Backends must apply the swap atomically.
#[async_trait]
pub trait RideStore: Send + Sync {
    /// Persist a new ride (status `Open`, empty request/confirmed sets).
    async fn create_ride(&self, params: &CreateRideParams) -> Result<Ride, StoreError>;

    /// Fetch a ride with its current version.
    async fn get_ride(&self, ride_id: &RideId) -> Result<VersionedRide, StoreError>;

    /// Conditionally replace a ride: succeeds only if the stored version
    /// still equals `expected_version`. Returns the stored ride on success.
    async fn update_ride(
        &self,
        ride_id: &RideId,
        expected_version: u64,
        ride: Ride,
    ) -> Result<Ride, StoreError>;

    /// Institution-scoped listing: rides whose status is in `statuses` and
    /// whose `scheduled_at >= min_scheduled_at`, ascending by `scheduled_at`.
    async fn list_by_institution(
        &self,
        institution_id: &InstitutionId,
        statuses: &[RideStatus],
        min_scheduled_at: DateTime<Utc>,
    ) -> Result<Vec<Ride>, StoreError>;

    /// Delete rides whose `expires_at` has passed; returns how many were
    /// removed. Invoked by the external retention sweep.
    async fn delete_expired_rides(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}

/// Chat thread persistence, keyed 1:1 by ride.
#[async_trait]
pub trait ChatStore: Send + Sync {
    /// Fetch the thread for a ride, if one exists.
    async fn get_thread(&self, ride_id: &RideId) -> Result<ChatThread, StoreError>;

    /// Create the thread for a ride with an initial participants snapshot.
    /// Fails with `AlreadyExists` if the ride already has a thread.
    async fn create_thread(
        &self,
        ride_id: &RideId,
        participants: &[UserId],
        expires_at: DateTime<Utc>,
    ) -> Result<ChatThread, StoreError>;

    /// Refresh an existing thread's retention deadline and participants
    /// snapshot (activity-driven; the snapshot is a cache, not authority).
    async fn refresh_thread(
        &self,
        ride_id: &RideId,
        participants: &[UserId],
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Append a message with a server-assigned timestamp, monotonically
    /// non-decreasing within the thread. Returns the stored message.
    async fn append_message(
        &self,
        ride_id: &RideId,
        sender_id: &UserId,
        ciphertext: &[u8],
        nonce: &[u8],
    ) -> Result<ChatMessage, StoreError>;

    /// Delete threads whose `expires_at` has passed; returns how many were
    /// removed. Invoked by the external retention sweep.
    async fn delete_expired_threads(&self, now: DateTime<Utc>) -> Result<u64, StoreError>;
}
