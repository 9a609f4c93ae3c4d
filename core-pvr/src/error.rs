//! # PVR Error Types
//!
//! Errors raised while constructing PVR bridge inputs. Runtime stream
//! operations never surface these; they report through booleans and sentinel
//! values instead.

use thiserror::Error;

/// Errors that can occur while setting up a PVR stream bridge.
#[derive(Error, Debug)]
pub enum PvrError {
    /// A properties snapshot was built with more entries than a backend may report.
    #[error("Too many streams in properties snapshot: {count} (max {max})")]
    TooManyStreams { count: usize, max: usize },

    /// Bridge configuration failed validation.
    #[error("Invalid bridge configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for PVR setup operations.
pub type Result<T> = std::result::Result<T, PvrError>;
