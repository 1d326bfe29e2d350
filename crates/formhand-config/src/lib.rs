//! # FormHand Config
//!
//! TOML configuration for the coordinator: server bind address, serial
//! device selection, and motion tuning. Every field has a default so an
//! absent file yields a working configuration.

mod error;
mod loader;
mod schema;

pub use error::ConfigError;
pub use loader::ConfigLoader;
pub use schema::{Config, MotionConfig, SerialConfig, ServerConfig};
