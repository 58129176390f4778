//! # Configuration
//!
//! Environment-driven configuration for the controller and its HTTP server.

mod controller;
mod server;

pub use controller::{ControllerConfig, LogFormat, TokenSource};
pub use server::ServerConfig;
