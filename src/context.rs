//! Application context.
//!
//! Everything the engine shares (the chat host, the record store, the id
//! allocator, the classification gate, the moderator roster and the guild
//! channel map) is built once at startup and handed around explicitly.

use crate::chat::{ChannelId, ChatHost, GuildId, UserId};
use crate::gate::ClassificationGate;
use crate::records::counter::IdAllocator;
use crate::records::store::RecordStore;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// The channels the engine cares about within one guild.
#[derive(Debug, Clone, Copy)]
pub struct GuildChannels {
    pub guild_id: GuildId,
    /// Channel whose messages run through the classification gate
    pub watch_channel: ChannelId,
    /// Channel receiving escalations and completion notices
    pub mod_channel: ChannelId,
}

/// Shared application state, constructed once at process start.
pub struct AppContext {
    pub host: Arc<dyn ChatHost>,
    pub store: Arc<RecordStore>,
    pub allocator: IdAllocator,
    pub gate: ClassificationGate,
    /// The bot's own platform identity; filer of automated reports
    pub bot_user_id: UserId,
    moderators: HashSet<UserId>,
    guilds: HashMap<GuildId, GuildChannels>,
}

impl AppContext {
    pub fn new(
        host: Arc<dyn ChatHost>,
        store: Arc<RecordStore>,
        allocator: IdAllocator,
        gate: ClassificationGate,
        bot_user_id: UserId,
        moderators: HashSet<UserId>,
        guilds: Vec<GuildChannels>,
    ) -> Self {
        Self {
            host,
            store,
            allocator,
            gate,
            bot_user_id,
            moderators,
            guilds: guilds.into_iter().map(|g| (g.guild_id, g)).collect(),
        }
    }

    /// Whether this user is on the moderator roster.
    pub fn is_moderator(&self, user_id: UserId) -> bool {
        self.moderators.contains(&user_id)
    }

    /// The moderation channel for a guild, if it is configured.
    pub fn mod_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.guilds.get(&guild_id).map(|g| g.mod_channel)
    }

    /// The watched channel for a guild, if it is configured.
    pub fn watch_channel(&self, guild_id: GuildId) -> Option<ChannelId> {
        self.guilds.get(&guild_id).map(|g| g.watch_channel)
    }

    /// Flush durable state on clean shutdown.
    pub fn shutdown(&self) {
        match self.allocator.flush() {
            Ok(()) => log::info!("Counter checkpoint flushed"),
            Err(e) => log::error!("Failed to flush counter checkpoint: {}", e),
        }
    }
}
