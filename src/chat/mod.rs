//! Chat platform capability surface.
//!
//! The engine never talks to a concrete chat platform directly. Checking that
//! a reported message's guild and channel are visible, fetching the message
//! itself, and sending text all go through the [`ChatHost`] trait. Production
//! wires a real connection behind it; the console harness and the test suite
//! use [`local::LocalChatHost`].

pub mod local;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub type UserId = u64;
pub type GuildId = u64;
pub type ChannelId = u64;
pub type MessageId = u64;

/// Guild/channel/message id triple identifying one message.
///
/// This is the only form a message takes inside persisted records. Live
/// handles are re-resolved from it on demand and never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageRef {
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
}

impl MessageRef {
    /// Render the `/guild/channel/message` link form users paste at us.
    pub fn link(&self) -> String {
        format!("/{}/{}/{}", self.guild_id, self.channel_id, self.message_id)
    }
}

/// Matches the id triple at the tail of a copied message link.
static MESSAGE_LINK_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)/(\d+)/(\d+)").expect("Invalid message link regex"));

/// Extract a [`MessageRef`] from a pasted message link.
///
/// Returns `None` when the input does not carry three id segments; id
/// overflow is treated the same as a malformed link.
pub fn parse_message_link(input: &str) -> Option<MessageRef> {
    let caps = MESSAGE_LINK_REGEX.captures(input)?;
    Some(MessageRef {
        guild_id: caps.get(1)?.as_str().parse().ok()?,
        channel_id: caps.get(2)?.as_str().parse().ok()?,
        message_id: caps.get(3)?.as_str().parse().ok()?,
    })
}

/// A point-in-time copy of a message fetched from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageSnapshot {
    pub reference: MessageRef,
    pub author_id: UserId,
    pub author_name: String,
    pub content: String,
}

/// Chat platform operation errors.
#[derive(Debug)]
pub enum ChatError {
    /// Guild, channel or message does not exist (or is not visible to us)
    NotFound(String),
    /// Transport-level failure talking to the platform
    Transport(String),
}

impl std::fmt::Display for ChatError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChatError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ChatError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ChatError {}

/// Trait for chat platform backends.
///
/// Every operation may fail with not-found; callers treat that as a
/// recoverable, user-visible condition rather than a crash.
#[async_trait]
pub trait ChatHost: Send + Sync {
    /// Whether the bot is a member of this guild.
    async fn has_guild(&self, guild_id: GuildId) -> bool;

    /// Whether the channel currently exists within the guild.
    async fn has_channel(&self, guild_id: GuildId, channel_id: ChannelId) -> bool;

    /// Fetch a message by its full reference.
    async fn fetch_message(&self, reference: MessageRef) -> Result<MessageSnapshot, ChatError>;

    /// Whether a channel (e.g. a stored DM channel) can still be reached.
    async fn channel_exists(&self, channel_id: ChannelId) -> bool;

    /// Deliver one line of text to a channel.
    async fn send(&self, channel_id: ChannelId, text: &str) -> Result<(), ChatError>;
}

/// Outcome of resolving a [`MessageRef`] against the live connection.
///
/// The distinct miss causes matter: the report flow shows a different
/// remediation message for each, while the record store collapses them all
/// into an unresolved message.
#[derive(Debug, Clone)]
pub enum Resolution {
    Resolved(MessageSnapshot),
    GuildMissing,
    ChannelMissing,
    MessageMissing,
}

impl Resolution {
    /// The snapshot, if resolution succeeded.
    pub fn into_snapshot(self) -> Option<MessageSnapshot> {
        match self {
            Resolution::Resolved(snapshot) => Some(snapshot),
            _ => None,
        }
    }
}

/// Resolve a message reference step by step: guild, then channel, then the
/// message itself.
pub async fn resolve_message(host: &dyn ChatHost, reference: MessageRef) -> Resolution {
    if !host.has_guild(reference.guild_id).await {
        return Resolution::GuildMissing;
    }
    if !host
        .has_channel(reference.guild_id, reference.channel_id)
        .await
    {
        return Resolution::ChannelMissing;
    }
    match host.fetch_message(reference).await {
        Ok(snapshot) => Resolution::Resolved(snapshot),
        Err(ChatError::NotFound(_)) => Resolution::MessageMissing,
        Err(err) => {
            log::warn!("Message fetch failed for {}: {}", reference.link(), err);
            Resolution::MessageMissing
        }
    }
}
