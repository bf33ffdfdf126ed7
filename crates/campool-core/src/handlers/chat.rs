//! Chat handlers: message history, sends, and room membership.
//!
//! One access rule everywhere: a user may touch a ride's chat iff they are
//! the creator, a requester, or confirmed on that ride. The rule is
//! re-derived from the live ride on every call; the thread's `participants`
//! snapshot is never consulted. `allow_chat = false` blocks sending but not
//! reading, so history stays visible after a creator disables chat.

use campool_events::{Connection, NewMessageEvent};
use campool_storage::{ChatMessage, RideId, StoreError};

use crate::auth::AuthContext;
use crate::error::ServiceError;
use crate::service::CampoolService;

pub async fn send_message(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
    ciphertext: &[u8],
    nonce: &[u8],
) -> Result<ChatMessage, ServiceError> {
    let ride = service.ride_snapshot(ride_id).await?;
    if !ride.allow_chat {
        return Err(ServiceError::Forbidden("chat disabled by creator"));
    }
    if !ride.is_participant(&ctx.user_id) {
        return Err(ServiceError::Forbidden("not part of this ride"));
    }

    service.ensure_thread(&ride).await?;
    let message = service
        .chats
        .append_message(ride_id, &ctx.user_id, ciphertext, nonce)
        .await?;

    // Fan out to whoever is in the room; delivery failures don't fail the
    // send, the message is already persisted.
    let event = NewMessageEvent {
        ride_id: *ride_id,
        sender_id: message.sender_id,
        ciphertext: message.ciphertext.clone(),
        nonce: message.nonce.clone(),
        sent_at: message.sent_at,
    };
    if let Err(err) = service.rooms.broadcast(ride_id, event).await {
        tracing::warn!(ride_id = %ride_id, error = %err, "room broadcast failed");
    }

    Ok(message)
}

/// Realtime send: same authorization and append path as the HTTP send, then
/// the same fanout. The two entry points must never diverge.
pub async fn send_room_message(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
    ciphertext: &[u8],
    nonce: &[u8],
) -> Result<ChatMessage, ServiceError> {
    send_message(service, ctx, ride_id, ciphertext, nonce).await
}

/// Message history. Reading never creates a thread; a ride without one has
/// an empty history. Allowed for participants even when `allow_chat` is off.
pub async fn list_messages(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
) -> Result<Vec<ChatMessage>, ServiceError> {
    let ride = service.ride_snapshot(ride_id).await?;
    if !ride.is_participant(&ctx.user_id) {
        return Err(ServiceError::Forbidden("not part of this ride"));
    }

    match service.chats.get_thread(ride_id).await {
        Ok(thread) => Ok(thread.messages),
        Err(StoreError::NotFound) => Ok(vec![]),
        Err(err) => Err(err.into()),
    }
}

/// Join a ride's realtime room.
///
/// Authorization is re-derived from the current ride record here, and only
/// here: broadcasts trust the membership established at join time. Every
/// failure path is silent; surfacing "not found" vs "forbidden" would let
/// an unauthorized prober confirm ride membership.
pub async fn join_room(
    service: &CampoolService,
    ctx: &AuthContext,
    ride_id: &RideId,
    connection: Connection,
) {
    let ride = match service.ride_snapshot(ride_id).await {
        Ok(ride) => ride,
        Err(err) => {
            tracing::debug!(ride_id = %ride_id, error = %err, "room join dropped");
            return;
        }
    };
    if !ride.is_participant(&ctx.user_id) {
        tracing::debug!(ride_id = %ride_id, user = %ctx.user_id, "room join denied");
        return;
    }
    if let Err(err) = service.rooms.join(ride_id, connection).await {
        tracing::warn!(ride_id = %ride_id, error = %err, "room join failed");
    }
}

/// Transport-level disconnect: drop the connection from every room it
/// joined.
pub async fn disconnect(service: &CampoolService, connection_id: &campool_events::ConnectionId) {
    if let Err(err) = service.rooms.disconnect(connection_id).await {
        tracing::warn!(connection = ?connection_id, error = %err, "disconnect cleanup failed");
    }
}
