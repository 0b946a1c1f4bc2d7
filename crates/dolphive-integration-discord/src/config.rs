//! Discord configuration

use serde::{Deserialize, Serialize};

use dolphive::DomainError;

/// Configuration for Discord integration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscordConfig {
    /// Discord bot token
    pub token: String,
    /// Retry a failed channel send as a direct message to the user
    pub dm_fallback: bool,
}

impl DiscordConfig {
    pub fn builder() -> DiscordConfigBuilder {
        DiscordConfigBuilder::default()
    }
}

/// Builder for [`DiscordConfig`]
#[derive(Debug, Clone, Default)]
pub struct DiscordConfigBuilder {
    token: Option<String>,
    dm_fallback: Option<bool>,
}

impl DiscordConfigBuilder {
    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn dm_fallback(mut self, enable: bool) -> Self {
        self.dm_fallback = Some(enable);
        self
    }

    pub fn build(self) -> Result<DiscordConfig, DomainError> {
        let token = self
            .token
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| DomainError::Validation("Discord token is required".into()))?;

        Ok(DiscordConfig {
            token,
            dm_fallback: self.dm_fallback.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_defaults() {
        let config = DiscordConfig::builder().token(" abc.def.ghi ").build().unwrap();
        assert_eq!(config.token, "abc.def.ghi");
        assert!(config.dm_fallback);
    }

    #[test]
    fn test_builder_requires_token() {
        assert!(DiscordConfig::builder().build().is_err());
        assert!(DiscordConfig::builder().token("  ").build().is_err());
    }

    #[test]
    fn test_builder_overrides() {
        let config = DiscordConfig::builder()
            .token("t")
            .dm_fallback(false)
            .build()
            .unwrap();
        assert!(!config.dm_fallback);
    }
}
