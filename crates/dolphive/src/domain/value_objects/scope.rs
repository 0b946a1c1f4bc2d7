//! ScopeId - Storage partition key
//!
//! A group conversation is stored under its guild id, a private
//! conversation under `dm-{user_id}`. Guild ids are numeric snowflakes, so
//! the `dm-` prefix keeps private scopes disjoint from group scopes and from
//! each other.

use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainError;
use crate::domain::value_objects::MemoryCategory;

const DIRECT_PREFIX: &str = "dm-";

/// Validated storage partition key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ScopeId(String);

impl ScopeId {
    /// Validate an already-derived scope id
    pub fn new(id: impl Into<String>) -> Result<Self, DomainError> {
        let id = id.into();
        if id.is_empty() {
            return Err(DomainError::Validation("Scope id must not be empty".into()));
        }
        if id.contains('/') || id.contains('\\') || id.starts_with('.') {
            return Err(DomainError::Validation(format!(
                "Scope id '{}' is not a valid path segment",
                id
            )));
        }
        // A scope named like a category would alias the legacy layout.
        if id.parse::<MemoryCategory>().is_ok() {
            return Err(DomainError::Validation(format!(
                "Scope id '{}' collides with a memory category",
                id
            )));
        }
        Ok(Self(id))
    }

    /// Derive the scope for a conversation context
    pub fn resolve(guild_id: Option<&str>, user_id: &str) -> Result<Self, DomainError> {
        match guild_id {
            Some(guild) => Self::guild(guild),
            None => Self::direct(user_id),
        }
    }

    pub fn guild(guild_id: &str) -> Result<Self, DomainError> {
        if guild_id.starts_with(DIRECT_PREFIX) {
            return Err(DomainError::Validation(format!(
                "Guild id '{}' uses the private scope prefix",
                guild_id
            )));
        }
        Self::new(guild_id)
    }

    pub fn direct(user_id: &str) -> Result<Self, DomainError> {
        if user_id.is_empty() {
            return Err(DomainError::Validation("User id must not be empty".into()));
        }
        Self::new(format!("{}{}", DIRECT_PREFIX, user_id))
    }

    /// Whether this scope belongs to a private conversation
    pub fn is_direct(&self) -> bool {
        self.0.starts_with(DIRECT_PREFIX)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ScopeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for ScopeId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for ScopeId {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ScopeId> for String {
    fn from(scope: ScopeId) -> Self {
        scope.0
    }
}

impl AsRef<str> for ScopeId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
