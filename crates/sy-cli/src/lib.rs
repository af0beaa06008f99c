//! switchyard CLI: library crate behind the `switchyard` binary.
//!
//! Exposes config loading, the domain handler table and the session router
//! so `sy-e2e-tests` can drive a whole session without a terminal.

pub mod config;
pub mod handlers;
pub mod session;
