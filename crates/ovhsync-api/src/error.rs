//! API client error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("resource not found: {path}")]
    NotFound { path: String },

    #[error("OVH API error (status {status}): {message}")]
    Remote { status: u16, message: String },

    #[error("missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ApiError {
    /// True when the provider reported the addressed resource as absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;
