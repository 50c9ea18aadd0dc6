//! Library entrypoint for standings-sync.
//!
//! Exposes all modules so integration tests can import them.

pub mod auth;
pub mod config;
pub mod data;
pub mod errors;
pub mod pipeline;
pub mod source;
pub mod store;

#[cfg(test)]
mod testing;
