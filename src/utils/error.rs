use thiserror::Error;

#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

impl InventoryError {
    /// Connection failures, timeouts and non-2xx statuses. These are the
    /// failures an inventory walk degrades past; everything else is fatal.
    pub fn is_transport(&self) -> bool {
        matches!(self, InventoryError::ApiError(e) if !e.is_decode() && !e.is_builder())
    }
}

pub type Result<T> = std::result::Result<T, InventoryError>;
