//! Sleep tracking HTTP service.
//!
//! This crate provides the HTTP API, configuration and CLI for snooze.

mod cli;
pub mod commands;
mod config;
pub mod error;
pub mod handlers;
pub mod router;
pub mod service;
pub mod state;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use router::build_router;
pub use state::AppState;
