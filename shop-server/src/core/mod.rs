//! Core module: configuration, state, server, tasks
//!
//! - [`Config`] — environment-driven configuration
//! - [`ServerState`] — shared service handles
//! - [`Server`] — HTTP server lifecycle
//! - [`ServerError`] — startup/infrastructure errors

pub mod config;
pub mod error;
pub mod server;
pub mod state;
pub mod tasks;

pub use config::{Config, ShopSettings};
pub use error::{Result, ServerError};
pub use server::Server;
pub use state::ServerState;
