//! Chat thread types.
//!
//! Threads store ciphertext only (end-to-end readiness): clients encrypt and
//! send `{ciphertext, nonce}`; the backend never sees plaintext.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{RideId, UserId};

/// A single encrypted message. The core never inspects `ciphertext`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender_id: UserId,
    pub ciphertext: Vec<u8>,
    pub nonce: Vec<u8>,
    /// Server-assigned; monotonically non-decreasing within a thread.
    pub sent_at: DateTime<Utc>,
}

/// Chat thread, keyed 1:1 by ride.
///
/// `participants` is a snapshot of ride membership at last activity, kept
/// only as a display/seed cache. It is never consulted for authorization;
/// the live ride is authoritative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatThread {
    pub ride_id: RideId,
    pub participants: Vec<UserId>,
    pub messages: Vec<ChatMessage>,
    /// Retention deadline, refreshed on every new message.
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
