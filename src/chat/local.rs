//! In-memory chat host.
//!
//! Backs the console harness and the test suite: guilds, channels and
//! messages are scripted up front, and everything the engine sends is
//! captured per channel for inspection.

use super::{ChannelId, ChatError, ChatHost, GuildId, MessageRef, MessageSnapshot};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Default)]
struct HostState {
    /// Guild Id -> channels the bot can see in it
    guilds: HashMap<GuildId, HashSet<ChannelId>>,
    /// Channels reachable for sends (guild channels and DM channels alike)
    channels: HashSet<ChannelId>,
    /// Fetchable messages
    messages: HashMap<MessageRef, MessageSnapshot>,
    /// Everything sent through the host, per channel, in order
    outbox: HashMap<ChannelId, Vec<String>>,
}

/// In-memory [`ChatHost`] backend.
#[derive(Default)]
pub struct LocalChatHost {
    state: Mutex<HostState>,
}

impl LocalChatHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a guild channel the bot can see.
    pub fn add_channel(&self, guild_id: GuildId, channel_id: ChannelId) {
        let mut state = self.state.lock().unwrap();
        state.guilds.entry(guild_id).or_default().insert(channel_id);
        state.channels.insert(channel_id);
    }

    /// Register a DM channel reachable for sends only.
    pub fn open_dm_channel(&self, channel_id: ChannelId) {
        self.state.lock().unwrap().channels.insert(channel_id);
    }

    /// Place a fetchable message, registering its guild and channel as well.
    pub fn add_message(&self, snapshot: MessageSnapshot) {
        let reference = snapshot.reference;
        self.add_channel(reference.guild_id, reference.channel_id);
        self.state
            .lock()
            .unwrap()
            .messages
            .insert(reference, snapshot);
    }

    /// Drop a message, as if it had been deleted on the platform.
    pub fn delete_message(&self, reference: MessageRef) {
        self.state.lock().unwrap().messages.remove(&reference);
    }

    /// Drop a channel from the guild listing and the reachable set.
    pub fn delete_channel(&self, guild_id: GuildId, channel_id: ChannelId) {
        let mut state = self.state.lock().unwrap();
        if let Some(channels) = state.guilds.get_mut(&guild_id) {
            channels.remove(&channel_id);
        }
        state.channels.remove(&channel_id);
    }

    /// Snapshot of everything sent to a channel so far.
    pub fn sent(&self, channel_id: ChannelId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .outbox
            .get(&channel_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Take and clear the send log for a channel.
    pub fn drain_sent(&self, channel_id: ChannelId) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .outbox
            .remove(&channel_id)
            .unwrap_or_default()
    }
}

#[async_trait]
impl ChatHost for LocalChatHost {
    async fn has_guild(&self, guild_id: GuildId) -> bool {
        self.state.lock().unwrap().guilds.contains_key(&guild_id)
    }

    async fn has_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> bool {
        self.state
            .lock()
            .unwrap()
            .guilds
            .get(&guild_id)
            .map(|channels| channels.contains(&channel_id))
            .unwrap_or(false)
    }

    async fn fetch_message(&self, reference: MessageRef) -> Result<MessageSnapshot, ChatError> {
        self.state
            .lock()
            .unwrap()
            .messages
            .get(&reference)
            .cloned()
            .ok_or_else(|| ChatError::NotFound(format!("message {}", reference.link())))
    }

    async fn channel_exists(&self, channel_id: ChannelId) -> bool {
        self.state.lock().unwrap().channels.contains(&channel_id)
    }

    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), ChatError> {
        let mut state = self.state.lock().unwrap();
        if !state.channels.contains(&channel_id) {
            return Err(ChatError::NotFound(format!("channel {}", channel_id)));
        }
        state
            .outbox
            .entry(channel_id)
            .or_default()
            .push(text.to_string());
        Ok(())
    }
}
