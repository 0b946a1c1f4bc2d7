//! Discord API client wrapper

use serenity::http::Http;
use serenity::model::channel::Message as SerenityMessage;
use serenity::model::id::{ChannelId, UserId};
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::DiscordConfig;

/// Discord API client
pub struct DiscordClient {
    http: Arc<Http>,
    config: DiscordConfig,
}

impl DiscordClient {
    /// Create a new Discord client
    pub fn new(config: DiscordConfig) -> Self {
        let http = Arc::new(Http::new(&config.token));
        Self { http, config }
    }

    pub fn config(&self) -> &DiscordConfig {
        &self.config
    }

    /// Ids of the guilds the bot is a member of
    pub async fn guild_ids(&self) -> Result<Vec<String>, serenity::Error> {
        let guilds = self.http.get_guilds(None, None).await?;
        debug!(count = guilds.len(), "Fetched guild list from Discord");
        Ok(guilds.into_iter().map(|g| g.id.to_string()).collect())
    }

    /// Send a message to a channel
    pub async fn send_message(
        &self,
        channel_id: u64,
        content: &str,
    ) -> Result<SerenityMessage, serenity::Error> {
        let channel = ChannelId::new(channel_id);
        debug!(channel_id = %channel_id, content_len = %content.len(), "Sending message to Discord");

        let message = channel
            .say(&self.http, content)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to send Discord message"))?;

        Ok(message)
    }

    /// Send a direct message to a user
    pub async fn send_direct_message(
        &self,
        user_id: u64,
        content: &str,
    ) -> Result<SerenityMessage, serenity::Error> {
        let user = UserId::new(user_id);
        debug!(user_id = %user_id, "Sending direct message on Discord");

        let dm = user.create_dm_channel(&self.http).await?;
        let message = dm
            .id
            .say(&self.http, content)
            .await
            .inspect_err(|e| error!(error = %e, "Failed to send Discord direct message"))?;

        Ok(message)
    }
}
