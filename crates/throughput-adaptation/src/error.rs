//! Error types for the adaptation engine

use thiserror::Error;

/// Errors raised while configuring or starting the adaptation engine.
///
/// The tick path itself never fails; degenerate inputs are clamped locally.
#[derive(Debug, Error)]
pub enum AdaptationError {
    /// A configuration value is outside its accepted range
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration sources could not be read or deserialized
    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The timer runtime for the tick loop could not be built
    #[error("failed to build tick runtime: {0}")]
    Runtime(#[source] std::io::Error),

    /// The background sampling thread could not be spawned
    #[error("failed to spawn sampling thread: {0}")]
    Spawn(#[source] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AdaptationError>;
