use std::time::Duration;

use thiserror::Error;

/// Centralized error types for the application
///
/// All errors in the application are converted to this enum for consistent error handling.
/// Uses `thiserror` for automatic error conversion and display formatting.
///
/// # Example
///
/// ```
/// use heraldbot::core::error::{AppError, AppResult};
///
/// fn reject(reason: &str) -> AppResult<()> {
///     Err(AppError::Broadcast(reason.to_string()))
/// }
///
/// assert!(reject("empty recipient list").is_err());
/// ```
#[derive(Error, Debug)]
pub enum AppError {
    /// Telegram API errors
    #[error("Telegram error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    /// IO errors (roster file, log file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A single broadcast delivery exceeded its deadline
    #[error("Send timed out after {0:?}")]
    SendTimeout(Duration),

    /// Broadcast bookkeeping errors: malformed job id, rejected input
    #[error("Broadcast error: {0}")]
    Broadcast(String),

    /// Anyhow errors (for general error handling)
    #[error("Application error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

/// Helper function to convert String to AppError::Broadcast
impl From<String> for AppError {
    fn from(err: String) -> Self {
        AppError::Broadcast(err)
    }
}

/// Helper function to convert &str to AppError::Broadcast
impl From<&str> for AppError {
    fn from(err: &str) -> Self {
        AppError::Broadcast(err.to_string())
    }
}
