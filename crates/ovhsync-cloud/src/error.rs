//! Reconciliation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CloudError {
    /// An absent-ensure was asked to delete a resource it cannot address.
    /// Raised before any API call is made.
    #[error("{0} is required with state: absent")]
    MissingField(&'static str),

    #[error(transparent)]
    Api(#[from] ovhsync_api::ApiError),
}

pub type Result<T> = std::result::Result<T, CloudError>;
