use thiserror::Error;

/// Core error type shared across Needlework crates.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration is malformed or missing a required value.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// The entity model violates internal invariants.
    #[error("model inconsistency: {0}")]
    ModelInconsistency(String),
}

impl From<toml::de::Error> for Error {
    fn from(value: toml::de::Error) -> Self {
        Error::Configuration(value.to_string())
    }
}

/// Convenience alias for results returned by Needlework crates.
pub type Result<T> = std::result::Result<T, Error>;
