//! # moodlog
//!
//! The Moodlog binary's library half: HTTP API, CLI and configuration.
//! Split from `main.rs` so integration tests can build the router directly.

pub mod api;
pub mod cli;
pub mod config;
pub mod error;

pub use error::AppError;
