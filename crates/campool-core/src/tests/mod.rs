//! Service tests, grouped like the handlers.

mod common;
mod handlers;
