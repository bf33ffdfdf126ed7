//! Common test helpers and utilities for service tests.
//!
//! Tests run the real service against the in-memory store and room bus;
//! helpers here build that wiring plus users and rides.

use std::sync::Arc;

use chrono::{Duration, Utc};
use uuid::Uuid;

use campool_events_memory::MemoryRoomBus;
use campool_storage::{InstitutionId, PreferredGender, Ride, RideId, RideStatus, RideStore, UserId};
use campool_store_memory::MemoryStore;

use crate::handlers::rides::{self, CreateRideRequest};
use crate::{AuthContext, CampoolService, ServiceConfig};

/// Service wired to in-memory backends, with handles kept so tests can
/// inspect store and room state directly.
pub struct TestService {
    pub service: CampoolService,
    pub store: Arc<MemoryStore>,
    pub rooms: Arc<MemoryRoomBus>,
}

impl TestService {
    /// Fetch a ride straight from the store, bypassing the handlers.
    pub async fn store_ride(&self, ride_id: &RideId) -> Ride {
        self.store.get_ride(ride_id).await.unwrap().ride
    }
}

pub fn create_test_service() -> TestService {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    let store = Arc::new(MemoryStore::new());
    let rooms = Arc::new(MemoryRoomBus::new());
    let service = CampoolService::new(
        store.clone(),
        store.clone(),
        rooms.clone(),
        ServiceConfig::default(),
    );
    TestService {
        service,
        store,
        rooms,
    }
}

pub fn test_institution() -> InstitutionId {
    InstitutionId(Uuid::new_v4())
}

/// A verified member of `institution`, as the identity provider would
/// resolve them.
pub fn test_user(institution: InstitutionId) -> AuthContext {
    AuthContext {
        user_id: UserId(Uuid::new_v4()),
        institution_id: institution,
        role: "student".to_string(),
    }
}

pub fn create_ride_request(seats: u32) -> CreateRideRequest {
    CreateRideRequest {
        available_seats: seats,
        preferred_gender: PreferredGender::Any,
        luggage_space: false,
        destination: "Central Station".to_string(),
        scheduled_at: Utc::now() + Duration::hours(6),
        allow_chat: true,
    }
}

pub async fn create_test_ride(svc: &TestService, creator: &AuthContext, seats: u32) -> Ride {
    rides::create_ride(&svc.service, creator, create_ride_request(seats))
        .await
        .unwrap()
}

/// The invariants that must hold at every observable point.
pub fn assert_ride_invariants(ride: &Ride) {
    for user in &ride.requests {
        assert!(
            !ride.confirmed_users.contains(user),
            "user {user} in both requests and confirmed_users"
        );
    }
    assert!(
        !ride.requests.contains(&ride.creator_id),
        "creator in requests"
    );
    assert!(
        !ride.confirmed_users.contains(&ride.creator_id),
        "creator in confirmed_users"
    );
    let unique: std::collections::HashSet<_> = ride.requests.iter().collect();
    assert_eq!(unique.len(), ride.requests.len(), "duplicate request");
    if ride.status == RideStatus::Full {
        assert_eq!(ride.available_seats, 0, "FULL ride with seats left");
    }
}
