//! Error type shared by the entities and registries.

use thiserror::Error;

use crate::fields::Status;

/// Everything that can go wrong inside the model.
///
/// None of these are fatal: the console prints them and returns to the menu.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PmError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },
    #[error("{entity} already exists: {key}")]
    Duplicate { entity: &'static str, key: String },
    #[error("cannot move from {from} to {to}")]
    InvalidTransition { from: Status, to: Status },
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("task {0} is already completed")]
    AlreadyCompleted(usize),
    #[error("access denied: {0}")]
    PermissionDenied(String),
}

impl PmError {
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound { entity, key: key.to_string() }
    }

    pub fn duplicate(entity: &'static str, key: impl ToString) -> Self {
        Self::Duplicate { entity, key: key.to_string() }
    }

    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, PmError>;
