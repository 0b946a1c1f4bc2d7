//! Domain Errors
//!
//! Error types for memory and reminder operations.

use thiserror::Error;

use crate::ports::StoreError;

/// Domain layer errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("{entity_type} not found: {id}")]
    NotFound { entity_type: String, id: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    /// Stored data could not be interpreted
    #[error("Repository error: {0}")]
    Repository(String),

    /// A notification could not be delivered
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error(transparent)]
    Store(StoreError),
}

impl DomainError {
    pub fn not_found<T: AsRef<str>>(entity_type: T, id: &str) -> Self {
        Self::NotFound {
            entity_type: entity_type.as_ref().to_string(),
            id: id.to_string(),
        }
    }

    /// Whether the backing store asked us to slow down
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, DomainError::Store(e) if e.is_rate_limited())
    }

    /// Message suitable for showing to the chat user
    pub fn user_message(&self) -> String {
        match self {
            DomainError::NotFound { entity_type, .. } => format!("{} not found.", entity_type),
            DomainError::Store(e) if e.is_permission_denied() => format!(
                "Storage access was denied. Please re-check the token's repository permissions. ({})",
                e
            ),
            DomainError::Store(e) if e.is_rate_limited() => match e.retry_after() {
                Some(delay) => format!(
                    "Storage is rate limited. Please try again in {} seconds.",
                    delay.as_secs().max(1)
                ),
                None => "Storage is rate limited. Please wait a moment and try again.".to_string(),
            },
            other => format!("Something went wrong: {}", other),
        }
    }
}

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(path) => DomainError::not_found("File", &path),
            StoreError::Conflict { path, message } => {
                DomainError::Conflict(format!("{}: {}", path, message))
            }
            other => DomainError::Store(other),
        }
    }
}
