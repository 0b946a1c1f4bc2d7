//! Process configuration
//!
//! Read from the environment; a `.env` file is honoured when present.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{bail, Context, Result};

use crate::adapters::{GitHubConfig, RepositoryTemplate};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_INDEX_CACHE_TTL_SECS: u64 = 60;
const DEFAULT_REMINDER_INTERVAL_SECS: u64 = 60;

/// Content store implementation to run against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StorageBackend {
    #[default]
    GitHub,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "github" => Ok(StorageBackend::GitHub),
            "memory" => Ok(StorageBackend::Memory),
            other => bail!("Unknown STORAGE_BACKEND '{}' (expected github or memory)", other),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub backend: StorageBackend,
    /// Present when `backend` is GitHub
    pub github: Option<GitHubConfig>,
    pub discord_token: Option<String>,
    pub api_key: Option<String>,
    pub bind_addr: String,
    pub index_cache_ttl: Duration,
    pub reminder_interval: Duration,
}

impl AppConfig {
    /// Load `.env` (if any) and read the process environment
    pub fn load() -> Result<Self> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("Failed to read .env");
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let backend = match var("STORAGE_BACKEND") {
            Some(value) => value.parse()?,
            None => StorageBackend::default(),
        };

        let github = match backend {
            StorageBackend::Memory => None,
            StorageBackend::GitHub => {
                let token = var("GITHUB_TOKEN").context("GITHUB_TOKEN is required")?;
                let owner = var("GITHUB_OWNER").context("GITHUB_OWNER is required")?;
                let repo = var("GITHUB_REPO").context("GITHUB_REPO is required")?;

                let template = match (var("GITHUB_TEMPLATE_OWNER"), var("GITHUB_TEMPLATE_REPO")) {
                    (Some(owner), Some(repo)) => Some(RepositoryTemplate { owner, repo }),
                    _ => None,
                };

                Some(
                    GitHubConfig::new(token, owner, repo)
                        .with_branch(var("GITHUB_BRANCH"))
                        .with_template(template)
                        .with_private(var("GITHUB_REPO_PRIVATE").map_or(true, |v| parse_flag(&v))),
                )
            }
        };

        Ok(Self {
            backend,
            github,
            discord_token: var("DISCORD_TOKEN"),
            api_key: var("DOLPHIVE_API_KEY"),
            bind_addr: var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            index_cache_ttl: Duration::from_secs(parse_secs(
                var("INDEX_CACHE_TTL_SECS"),
                "INDEX_CACHE_TTL_SECS",
                DEFAULT_INDEX_CACHE_TTL_SECS,
            )?),
            reminder_interval: Duration::from_secs(parse_secs(
                var("REMINDER_INTERVAL_SECS"),
                "REMINDER_INTERVAL_SECS",
                DEFAULT_REMINDER_INTERVAL_SECS,
            )?),
        })
    }

    /// Warnings about values that look wrong but are not fatal
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Some(github) = &self.github {
            if !github.token.starts_with("ghp_") && !github.token.starts_with("github_pat_") {
                warnings.push(
                    "GITHUB_TOKEN does not look like a personal access token (ghp_ / github_pat_)"
                        .to_string(),
                );
            }
        }

        if let Some(token) = &self.discord_token {
            if token.split('.').count() != 3 || token.split('.').any(str::is_empty) {
                warnings.push("DISCORD_TOKEN does not have the expected three segments".to_string());
            }
        }

        warnings
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}

fn parse_secs(value: Option<String>, key: &str, default: u64) -> Result<u64> {
    match value {
        Some(v) => v
            .parse()
            .with_context(|| format!("{} must be a number of seconds, got '{}'", key, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| map.get(key).cloned())
    }

    const GITHUB: [(&str, &str); 3] = [
        ("GITHUB_TOKEN", "ghp_abc"),
        ("GITHUB_OWNER", "me"),
        ("GITHUB_REPO", "notes"),
    ];

    #[test]
    fn test_github_defaults() {
        let config = load(&GITHUB).unwrap();
        assert_eq!(config.backend, StorageBackend::GitHub);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.index_cache_ttl, Duration::from_secs(60));
        assert_eq!(config.reminder_interval, Duration::from_secs(60));

        let github = config.github.unwrap();
        assert!(github.private);
        assert_eq!(github.branch, None);
        assert_eq!(github.template, None);
    }

    #[test]
    fn test_github_requires_credentials() {
        let err = load(&[("GITHUB_OWNER", "me")]).unwrap_err();
        assert!(err.to_string().contains("GITHUB_TOKEN"));
    }

    #[test]
    fn test_memory_backend_needs_nothing() {
        let config = load(&[("STORAGE_BACKEND", "memory")]).unwrap();
        assert_eq!(config.backend, StorageBackend::Memory);
        assert!(config.github.is_none());
        assert!(config.validate().is_empty());
    }

    #[test]
    fn test_optional_github_settings() {
        let mut vars = GITHUB.to_vec();
        vars.extend([
            ("GITHUB_BRANCH", "main"),
            ("GITHUB_TEMPLATE_OWNER", "tmpl"),
            ("GITHUB_TEMPLATE_REPO", "memory-template"),
            ("GITHUB_REPO_PRIVATE", "no"),
        ]);
        let github = load(&vars).unwrap().github.unwrap();
        assert_eq!(github.branch.as_deref(), Some("main"));
        assert!(!github.private);
        assert_eq!(
            github.template,
            Some(RepositoryTemplate {
                owner: "tmpl".into(),
                repo: "memory-template".into()
            })
        );
    }

    #[test]
    fn test_private_flag_spellings() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(parse_flag("yes"));
        assert!(!parse_flag("false"));
    }

    #[test]
    fn test_bad_numbers_and_backends_fail() {
        assert!(load(&[("STORAGE_BACKEND", "s3")]).is_err());
        assert!(load(&[("STORAGE_BACKEND", "memory"), ("REMINDER_INTERVAL_SECS", "soon")]).is_err());
    }

    #[test]
    fn test_validate_warns_on_token_shapes() {
        let mut vars = vec![
            ("GITHUB_TOKEN", "abc"),
            ("GITHUB_OWNER", "me"),
            ("GITHUB_REPO", "notes"),
            ("DISCORD_TOKEN", "only.two"),
        ];
        let warnings = load(&vars).unwrap().validate();
        assert_eq!(warnings.len(), 2);

        vars[0] = ("GITHUB_TOKEN", "github_pat_abc");
        vars[3] = ("DISCORD_TOKEN", "a.b.c");
        assert!(load(&vars).unwrap().validate().is_empty());
    }
}
