//! Type definitions for campool storage.

mod chat;
mod ids;
mod rides;

// Re-export all types from submodules
pub use chat::*;
pub use ids::*;
pub use rides::*;
