//! Ride types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{InstitutionId, RideId, UserId};

/// Ride lifecycle status. `Closed` is absorbing: no mutation is permitted on
/// a closed ride, only reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RideStatus {
    Open,
    Full,
    Closed,
}

/// Descriptive seat filter; carried through as metadata, not enforced here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PreferredGender {
    #[default]
    Any,
    Male,
    Female,
}

/// Ride record.
///
/// `requests` and `confirmed_users` are insertion-ordered and duplicate-free,
/// disjoint from each other, and never contain `creator_id`. All mutation
/// goes through the lifecycle engine so those invariants hold at every
/// observable point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ride {
    pub id: RideId,
    pub creator_id: UserId,
    pub creator_institution_id: InstitutionId,
    pub available_seats: u32,
    pub preferred_gender: PreferredGender,
    pub luggage_space: bool,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub allow_chat: bool,
    pub requests: Vec<UserId>,
    pub confirmed_users: Vec<UserId>,
    pub status: RideStatus,
    /// Retention deadline; records past this point are eligible for deletion
    /// by the sweep job.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ride {
    /// Derived membership: creator plus everyone who requested or was
    /// confirmed. Recomputed on every authorization check; never cached as
    /// ground truth.
    pub fn participants(&self) -> Vec<UserId> {
        let mut out = Vec::with_capacity(1 + self.requests.len() + self.confirmed_users.len());
        out.push(self.creator_id);
        out.extend(self.requests.iter().copied());
        out.extend(self.confirmed_users.iter().copied());
        out
    }

    /// Whether `user_id` may read/write this ride's chat and join its room.
    pub fn is_participant(&self, user_id: &UserId) -> bool {
        self.creator_id == *user_id
            || self.requests.contains(user_id)
            || self.confirmed_users.contains(user_id)
    }

    pub fn has_requested(&self, user_id: &UserId) -> bool {
        self.requests.contains(user_id)
    }

    pub fn is_confirmed(&self, user_id: &UserId) -> bool {
        self.confirmed_users.contains(user_id)
    }
}

/// Parameters for creating a ride.
#[derive(Clone, Debug)]
pub struct CreateRideParams {
    pub creator_id: UserId,
    pub creator_institution_id: InstitutionId,
    pub available_seats: u32,
    pub preferred_gender: PreferredGender,
    pub luggage_space: bool,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub allow_chat: bool,
    pub expires_at: DateTime<Utc>,
}
