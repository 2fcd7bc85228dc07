//! Error types for the designer core

use thiserror::Error;

use crate::model::PropertyId;

/// Result alias used across the library
pub type Result<T> = std::result::Result<T, DesignerError>;

#[derive(Error, Debug)]
pub enum DesignerError {
    /// Identifier is not part of the property catalog
    #[error("unknown property: {0}")]
    NotFound(PropertyId),

    /// A raw control value or selection could not be accepted
    #[error("validation error: {0}")]
    Validation(String),

    /// The optimizer collaborator failed
    #[error("optimizer error: {0}")]
    Optimizer(String),

    /// A run was triggered while the previous one is unresolved
    #[error("an optimization run is already in flight")]
    RunInFlight,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DesignerError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn optimizer(msg: impl Into<String>) -> Self {
        Self::Optimizer(msg.into())
    }
}

impl From<reqwest::Error> for DesignerError {
    fn from(err: reqwest::Error) -> Self {
        Self::Optimizer(err.to_string())
    }
}
