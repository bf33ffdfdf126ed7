//! Ride handlers: create, list, request, cancel, decide, reschedule, close.
//!
//! Status is never set independently of seat accounting: `Full` is reached
//! only by the acceptance that takes the last seat, and `Closed` only by an
//! explicit close. Every mutation of an existing ride goes through the
//! service's conditional-update loop, so two concurrent accepts of the last
//! seat cannot both land.

use chrono::{DateTime, Utc};

use campool_storage::{CreateRideParams, PreferredGender, Ride, RideId, RideStatus, UserId};

use crate::auth::AuthContext;
use crate::error::ServiceError;
use crate::retention;
use crate::service::CampoolService;

const MIN_SEATS: u32 = 1;
const MAX_SEATS: u32 = 10;
const MIN_DESTINATION_LEN: usize = 2;
const MAX_DESTINATION_LEN: usize = 120;

/// Creator's verdict on a pending seat request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Reject,
}

#[derive(Clone, Debug)]
pub struct CreateRideRequest {
    pub available_seats: u32,
    pub preferred_gender: PreferredGender,
    pub luggage_space: bool,
    pub destination: String,
    pub scheduled_at: DateTime<Utc>,
    pub allow_chat: bool,
}

pub async fn create_ride(
    service: &CampoolService,
    ctx: &AuthContext,
    req: CreateRideRequest,
) -> Result<Ride, ServiceError> {
    if !(MIN_SEATS..=MAX_SEATS).contains(&req.available_seats) {
        return Err(ServiceError::InvalidArgument(format!(
            "available_seats must be between {} and {}",
            MIN_SEATS, MAX_SEATS
        )));
    }
    let destination = req.destination.trim();
    if !(MIN_DESTINATION_LEN..=MAX_DESTINATION_LEN).contains(&destination.chars().count()) {
        return Err(ServiceError::InvalidArgument(format!(
            "destination must be between {} and {} characters",
            MIN_DESTINATION_LEN, MAX_DESTINATION_LEN
        )));
    }

    let ride = service
        .rides
        .create_ride(&CreateRideParams {
            creator_id: ctx.user_id,
            creator_institution_id: ctx.institution_id,
            available_seats: req.available_seats,
            preferred_gender: req.preferred_gender,
            luggage_space: req.luggage_space,
            destination: destination.to_string(),
            scheduled_at: req.scheduled_at,
            allow_chat: req.allow_chat,
            // Nobody is confirmed yet: short retention window.
            expires_at: retention::ride_expiry(&service.config, req.scheduled_at, false),
        })
        .await?;

    tracing::debug!(ride_id = %ride.id, creator = %ctx.user_id, "ride created");
    Ok(ride)
}

/// Same-institution listing: open or full rides whose scheduled time is no
/// further in the past than the configured lookback, soonest first.
pub async fn list_rides(
    service: &CampoolService,
    ctx: &AuthContext,
) -> Result<Vec<Ride>, ServiceError> {
    let min_scheduled_at =
        Utc::now() - chrono::Duration::hours(service.config.listing_lookback_hours);
    Ok(service
        .rides
        .list_by_institution(
            &ctx.institution_id,
            &[RideStatus::Open, RideStatus::Full],
            min_scheduled_at,
        )
        .await?)
}

pub async fn request_ride(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
) -> Result<Ride, ServiceError> {
    let user_id = ctx.user_id;
    let institution_id = ctx.institution_id;
    service
        .mutate_ride(ride_id, move |ride| {
            if ride.creator_institution_id != institution_id {
                return Err(ServiceError::Forbidden("cross-institution access denied"));
            }
            if ride.status == RideStatus::Closed {
                return Err(ServiceError::InvalidState("ride is closed"));
            }
            // Covers duplicate requests, already-confirmed users, and the
            // creator asking to join their own ride.
            if ride.is_participant(&user_id) {
                return Err(ServiceError::Conflict("already requested or confirmed"));
            }

            let mut updated = ride.clone();
            updated.requests.push(user_id);
            Ok(updated)
        })
        .await
}

pub async fn cancel_request(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
) -> Result<Ride, ServiceError> {
    let user_id = ctx.user_id;
    service
        .mutate_ride(ride_id, move |ride| {
            if ride.status == RideStatus::Closed {
                return Err(ServiceError::InvalidState("ride is closed"));
            }
            if !ride.has_requested(&user_id) {
                return Err(ServiceError::Conflict("no pending request to cancel"));
            }

            let mut updated = ride.clone();
            updated.requests.retain(|u| u != &user_id);
            Ok(updated)
        })
        .await
}

pub async fn decide_request(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
    target_user_id: &UserId,
    decision: Decision,
) -> Result<Ride, ServiceError> {
    let actor_id = ctx.user_id;
    let target = *target_user_id;
    let config = service.config.clone();
    service
        .mutate_ride(ride_id, move |ride| {
            if ride.status == RideStatus::Closed {
                return Err(ServiceError::InvalidState("ride is closed"));
            }
            if ride.creator_id != actor_id {
                return Err(ServiceError::Forbidden("only creator can decide"));
            }
            if !ride.has_requested(&target) {
                return Err(ServiceError::Conflict("user did not request"));
            }

            let mut updated = ride.clone();
            match decision {
                Decision::Reject => {
                    updated.requests.retain(|u| u != &target);
                }
                Decision::Accept => {
                    if ride.available_seats == 0 {
                        return Err(ServiceError::InvalidState("no seats left"));
                    }
                    updated.requests.retain(|u| u != &target);
                    updated.confirmed_users.push(target);
                    updated.available_seats -= 1;
                    if updated.available_seats == 0 {
                        updated.status = RideStatus::Full;
                    }
                    // Someone is now confirmed: switch to the long window.
                    updated.expires_at =
                        retention::ride_expiry(&config, updated.scheduled_at, true);
                }
            }
            Ok(updated)
        })
        .await
}

pub async fn update_ride_time(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
    scheduled_at: DateTime<Utc>,
) -> Result<Ride, ServiceError> {
    let actor_id = ctx.user_id;
    let config = service.config.clone();
    service
        .mutate_ride(ride_id, move |ride| {
            if ride.status == RideStatus::Closed {
                return Err(ServiceError::InvalidState("ride is closed"));
            }
            if ride.creator_id != actor_id {
                return Err(ServiceError::Forbidden("only creator can update time"));
            }

            let mut updated = ride.clone();
            updated.scheduled_at = scheduled_at;
            updated.expires_at = retention::recompute_ride_expiry(&config, &updated);
            Ok(updated)
        })
        .await
}

pub async fn close_ride(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
) -> Result<Ride, ServiceError> {
    let actor_id = ctx.user_id;
    service
        .mutate_ride(ride_id, move |ride| {
            if ride.status == RideStatus::Closed {
                return Err(ServiceError::InvalidState("ride is closed"));
            }
            if ride.creator_id != actor_id {
                return Err(ServiceError::Forbidden("only creator can close"));
            }

            let mut updated = ride.clone();
            updated.status = RideStatus::Closed;
            Ok(updated)
        })
        .await
}
