//! # Formpilot Config
//!
//! Configuration management for Formpilot.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::*;
