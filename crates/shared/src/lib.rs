//! Shared library for the video console.
//!
//! This crate provides the functionality common to the console library and
//! its binary:
//! - Configuration management
//! - Data models exchanged with the video-processing backend
//! - Logging infrastructure

pub mod config;
pub mod logging;
pub mod models;

// Re-export commonly used types
pub use config::Config;
pub use logging::LogConfig;
pub use models::*;

/// Common result type using anyhow::Error
pub type Result<T> = anyhow::Result<T>;
