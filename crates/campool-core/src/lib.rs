//! Service core for campool: the ride lifecycle state machine and its
//! coupling to chat-access authorization and realtime room membership.
//!
//! The core sits between an external identity provider (callers hand us a
//! resolved [`auth::AuthContext`], never a raw credential), the store traits
//! from `campool-storage`, and the room bus from `campool-events`. Transport
//! plumbing (HTTP routing, socket handshakes) lives outside this crate and
//! calls into [`handlers`].

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod retention;
pub mod service;

pub use auth::AuthContext;
pub use config::{ConfigError, ServiceConfig};
pub use error::ServiceError;
pub use service::CampoolService;

#[cfg(test)]
mod tests;
