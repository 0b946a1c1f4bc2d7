//! Discord Integration for Dolphive
//!
//! Reminder delivery and scope resolution for the Discord memory bot.
//!
//! # Usage
//!
//! ```rust,ignore
//! use dolphive_integration_discord::{DiscordClient, DiscordConfig, DiscordNotifier};
//!
//! let config = DiscordConfig::builder().token("your-bot-token").build()?;
//! let notifier = DiscordNotifier::new(Arc::new(DiscordClient::new(config)));
//! ```

mod client;
mod config;
mod notifier;
mod scope;

pub use client::DiscordClient;
pub use config::{DiscordConfig, DiscordConfigBuilder};
pub use notifier::{channel_text, direct_text, DiscordNotifier};
pub use scope::{resolve_scope, scope_for_message};
