//! Retention deadline computation and the expiry sweep.
//!
//! Ride deadlines are a pure function of current ride state: every
//! state-affecting mutation recomputes `expires_at` from `scheduled_at` and
//! whether anyone is confirmed, so the deadline never creeps forward on its
//! own. Chat deadlines are different on purpose: they refresh from the last
//! message time, monotonic with activity.

use chrono::{DateTime, Duration, Utc};

use campool_storage::Ride;

use crate::config::ServiceConfig;
use crate::error::ServiceError;
use crate::service::CampoolService;

/// Deadline for a ride: scheduled time plus the retention window for its
/// confirmation state (7 days unconfirmed, 30 days confirmed by default).
pub fn ride_expiry(
    config: &ServiceConfig,
    scheduled_at: DateTime<Utc>,
    has_confirmed: bool,
) -> DateTime<Utc> {
    let days = if has_confirmed {
        config.confirmed_retention_days
    } else {
        config.unconfirmed_retention_days
    };
    scheduled_at + Duration::days(days)
}

/// Recomputed deadline for an existing ride record.
pub fn recompute_ride_expiry(config: &ServiceConfig, ride: &Ride) -> DateTime<Utc> {
    ride_expiry(config, ride.scheduled_at, !ride.confirmed_users.is_empty())
}

/// Deadline for a chat thread, measured from the triggering activity.
pub fn chat_expiry(config: &ServiceConfig, now: DateTime<Utc>) -> DateTime<Utc> {
    now + Duration::days(config.chat_retention_days)
}

/// Counts from one retention sweep pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepStats {
    pub rides_removed: u64,
    pub threads_removed: u64,
}

/// Delete rides and chat threads whose deadline has passed.
///
/// Driven by an external scheduler; the core only guarantees the deadlines
/// it computes, not when this runs.
pub async fn sweep_expired(
    service: &CampoolService,
    now: DateTime<Utc>,
) -> Result<SweepStats, ServiceError> {
    let rides_removed = service.rides.delete_expired_rides(now).await?;
    let threads_removed = service.chats.delete_expired_threads(now).await?;
    if rides_removed > 0 || threads_removed > 0 {
        tracing::info!(rides_removed, threads_removed, "retention sweep");
    }
    Ok(SweepStats {
        rides_removed,
        threads_removed,
    })
}
