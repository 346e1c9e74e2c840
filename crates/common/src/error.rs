//! Error types for multiload

use thiserror::Error;

/// Result type alias using the multiload Error
pub type Result<T> = std::result::Result<T, Error>;

/// Multiload error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),

    #[error("Missing setting: {0}")]
    MissingSetting(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Work unit '{unit}' failed: {reason}")]
    WorkUnit { unit: String, reason: String },
}

impl From<aes::cipher::InvalidLength> for Error {
    fn from(e: aes::cipher::InvalidLength) -> Self {
        Error::Crypto(format!("Invalid key length: {}", e))
    }
}

impl From<rand::Error> for Error {
    fn from(e: rand::Error) -> Self {
        Error::Crypto(format!("Key generation failed: {}", e))
    }
}

impl Error {
    /// True for errors that abort setup before any worker starts
    pub fn is_setup(&self) -> bool {
        matches!(
            self,
            Error::MissingSetting(_) | Error::InvalidConfig(_) | Error::Toml(_)
        )
    }
}
