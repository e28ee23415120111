//! Core application plumbing: configuration, constants and logging.

pub mod config;
pub mod constants;
pub mod logging;

pub use config::{BatchConfig, EngineConfig};
pub use logging::init_logging;
