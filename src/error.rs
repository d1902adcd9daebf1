//! Error types for page-tracker

use thiserror::Error;

pub use crate::config::ConfigError;

/// Main error type for the page-tracker library.
///
/// None of these ever reach the instrumented page. They surface only from
/// the embedding-side APIs (loading options, starting a beacon worker).
#[derive(Error, Debug)]
pub enum Error {
    /// Options intake failed
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Beacon back-end could not be started
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type alias for page-tracker
pub type Result<T> = std::result::Result<T, Error>;
