//! The service type shared by all handlers.

use std::sync::Arc;

use chrono::Utc;

use campool_events::RoomBus;
use campool_storage::{ChatStore, Ride, RideId, RideStore, StoreError, VersionedRide};

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::retention;

/// How many times a ride mutation re-reads and retries after losing a
/// conditional update. Each lost attempt implies another writer committed,
/// so exhaustion means the record is under sustained contention.
const CAS_ATTEMPTS: usize = 8;

/// Shared service state: the two stores, the realtime room bus, and config.
#[derive(Clone)]
pub struct CampoolService {
    pub rides: Arc<dyn RideStore>,
    pub chats: Arc<dyn ChatStore>,
    pub rooms: Arc<dyn RoomBus>,
    pub config: ServiceConfig,
}

impl CampoolService {
    pub fn new(
        rides: Arc<dyn RideStore>,
        chats: Arc<dyn ChatStore>,
        rooms: Arc<dyn RoomBus>,
        config: ServiceConfig,
    ) -> Self {
        Self {
            rides,
            chats,
            rooms,
            config,
        }
    }

    /// Fetch a ride without its version, for read-only checks.
    pub(crate) async fn ride_snapshot(&self, ride_id: &RideId) -> Result<Ride, ServiceError> {
        Ok(self.rides.get_ride(ride_id).await?.ride)
    }

    /// Read-modify-write on one ride as an optimistic compare-and-swap.
    ///
    /// `apply` re-checks its preconditions against the freshest record on
    /// every attempt and returns the mutated ride; precondition failures are
    /// terminal and leave the record untouched (no write is issued). A lost
    /// swap re-reads and retries.
    pub(crate) async fn mutate_ride<F>(
        &self,
        ride_id: &RideId,
        mut apply: F,
    ) -> Result<Ride, ServiceError>
    where
        F: FnMut(&Ride) -> Result<Ride, ServiceError>,
    {
        for _ in 0..CAS_ATTEMPTS {
            let VersionedRide { ride, version } = self.rides.get_ride(ride_id).await?;
            let updated = apply(&ride)?;
            match self.rides.update_ride(ride_id, version, updated).await {
                Ok(stored) => return Ok(stored),
                Err(StoreError::Conflict) => {
                    tracing::debug!(ride_id = %ride_id, "lost conditional update, retrying");
                    continue;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StoreError::Conflict.into())
    }

    /// Idempotent get-or-create of the ride's chat thread.
    ///
    /// On create the thread is seeded with the current membership snapshot;
    /// on an existing thread the retention deadline (and the snapshot cache)
    /// is refreshed. Either way the deadline lands at now + chat retention.
    pub(crate) async fn ensure_thread(&self, ride: &Ride) -> Result<(), ServiceError> {
        let participants = ride.participants();
        let expires_at = retention::chat_expiry(&self.config, Utc::now());

        match self.chats.get_thread(&ride.id).await {
            Ok(_) => {
                self.chats
                    .refresh_thread(&ride.id, &participants, expires_at)
                    .await?;
            }
            Err(StoreError::NotFound) => {
                match self
                    .chats
                    .create_thread(&ride.id, &participants, expires_at)
                    .await
                {
                    Ok(_) => {}
                    // Lost a create race; the winner's thread carries an
                    // equivalent deadline.
                    Err(StoreError::AlreadyExists) => {}
                    Err(err) => return Err(err.into()),
                }
            }
            Err(err) => return Err(err.into()),
        }
        Ok(())
    }
}
