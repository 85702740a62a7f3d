//! Error types for the cellfill reconstruction engine.

use thiserror::Error;

/// Errors surfaced to callers.
///
/// Missing or conflicting rulings are never errors; the engine degrades to
/// "no cell for this gap". Only malformed input is rejected.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("invalid region ({left}, {top}, {width}, {height}): size must be positive and finite")]
    InvalidRegion {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },

    #[error("non-finite coordinate in {0}")]
    NonFiniteGeometry(&'static str),

    #[error("thread pool error: {0}")]
    ThreadPool(String),
}

/// Convenience Result type alias for GridError.
pub type Result<T> = std::result::Result<T, GridError>;
