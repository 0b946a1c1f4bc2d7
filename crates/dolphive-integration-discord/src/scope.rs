//! Scope resolution for Discord messages

use serenity::model::channel::Message;
use serenity::model::id::{GuildId, UserId};

use dolphive::{DomainError, ScopeId};

/// Guild messages share the guild's scope; DMs get a per-user scope
pub fn resolve_scope(guild_id: Option<GuildId>, user_id: UserId) -> Result<ScopeId, DomainError> {
    let guild = guild_id.map(|g| g.to_string());
    ScopeId::resolve(guild.as_deref(), &user_id.to_string())
}

pub fn scope_for_message(message: &Message) -> Result<ScopeId, DomainError> {
    resolve_scope(message.guild_id, message.author.id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guild_message_scope() {
        let scope = resolve_scope(Some(GuildId::new(123456789)), UserId::new(42)).unwrap();
        assert_eq!(scope.as_str(), "123456789");
    }

    #[test]
    fn test_direct_message_scope() {
        let scope = resolve_scope(None, UserId::new(42)).unwrap();
        assert_eq!(scope.as_str(), "dm-42");
        assert!(scope.is_direct());
    }
}
