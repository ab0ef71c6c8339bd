use thiserror::Error;

use crate::domain::AccountId;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("User already exists: {0}")]
    UserAlreadyExists(String),

    #[error("Invalid username: '{0}'")]
    InvalidUsername(String),

    #[error("Account is blocked: {0}")]
    AccountBlocked(AccountId),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    /// True for errors caused by a missing account or user.
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::AccountNotFound(_) | AppError::UserNotFound(_))
    }
}
