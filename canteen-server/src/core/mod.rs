//! Core server plumbing: configuration, shared state, HTTP server

mod config;
mod server;
mod state;

pub use config::{Config, PickupPolicy};
pub use server::Server;
pub use state::ServerState;
