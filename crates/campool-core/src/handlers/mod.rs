//! Request handlers, grouped by domain.
//!
//! Handlers take the shared [`crate::CampoolService`] plus the caller's
//! resolved [`crate::AuthContext`]; the transport layer owns
//! (de)serialization and credential verification.

pub mod chat;
pub mod rides;
