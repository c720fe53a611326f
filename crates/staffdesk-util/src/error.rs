//! Error types for staffdesk

use thiserror::Error;

/// Shared error type for staffdesk operations
#[derive(Debug, Error)]
pub enum StaffdeskError {
    #[error("Invalid date '{value}': {message}")]
    InvalidDate { value: String, message: String },
}
