//! Error types for the grass kernel

use thiserror::Error;

/// Main error type for the crate.
///
/// The per-blade kernel never fails; these errors only surface when building
/// a system or loading its configuration.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Buffer too small: need {expected} blades, got {actual}")]
    BufferSize { expected: usize, actual: usize },
}
