//! SmartFDX Core - Core data structures and configuration
//!
//! This module defines the shared domain types, configuration, error and
//! logging infrastructure for the SmartFDX gateway.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tokio;
pub use tracing;
