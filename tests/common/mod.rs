//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use warden::chat::local::LocalChatHost;
use warden::chat::{MessageRef, MessageSnapshot};
use warden::classifier::{Classifier, ClassifierError, HistoryLevel, Verdict};
use warden::context::{AppContext, GuildChannels};
use warden::gate::ClassificationGate;
use warden::records::counter::IdAllocator;
use warden::records::store::RecordStore;
use warden::router::SessionRouter;

pub const GUILD: u64 = 1;
pub const WATCH_CHANNEL: u64 = 10;
pub const MOD_CHANNEL: u64 = 11;

pub const REPORTER: u64 = 42;
pub const REPORTER_DM: u64 = 9;
pub const MODERATOR: u64 = 1000;
pub const MODERATOR_DM: u64 = 19;
pub const SUSPECT: u64 = 50;
pub const BOT_USER: u64 = 5;

/// The message everyone reports in these tests.
pub fn target() -> MessageRef {
    MessageRef {
        guild_id: GUILD,
        channel_id: 2,
        message_id: 3,
    }
}

pub fn target_snapshot() -> MessageSnapshot {
    MessageSnapshot {
        reference: target(),
        author_id: SUSPECT,
        author_name: "suspect".to_string(),
        content: "pay me or else".to_string(),
    }
}

/// A message posted in the guild's watched channel.
pub fn watched_snapshot(message_id: u64, content: &str) -> MessageSnapshot {
    MessageSnapshot {
        reference: MessageRef {
            guild_id: GUILD,
            channel_id: WATCH_CHANNEL,
            message_id,
        },
        author_id: SUSPECT,
        author_name: "suspect".to_string(),
        content: content.to_string(),
    }
}

/// Replays a scripted verdict sequence; once the script runs out every
/// message is NotFlagged.
pub struct ScriptedClassifier {
    script: Mutex<Vec<Result<Verdict, ClassifierError>>>,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Result<Verdict, ClassifierError>>) -> Self {
        Self {
            script: Mutex::new(script),
        }
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(
        &self,
        _message: &str,
        _history: HistoryLevel,
    ) -> Result<Verdict, ClassifierError> {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            Ok(Verdict::NotFlagged)
        } else {
            script.remove(0)
        }
    }
}

/// A fully wired engine over an in-memory host and a temp data directory.
pub struct Fixture {
    pub host: Arc<LocalChatHost>,
    pub ctx: Arc<AppContext>,
    pub router: SessionRouter,
    /// Keeps the data directory alive for the test's duration
    pub dir: tempfile::TempDir,
}

pub fn fixture() -> Fixture {
    fixture_with(Vec::new())
}

pub fn fixture_with(script: Vec<Result<Verdict, ClassifierError>>) -> Fixture {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");

    let host = Arc::new(LocalChatHost::new());
    host.add_channel(GUILD, WATCH_CHANNEL);
    host.add_channel(GUILD, MOD_CHANNEL);
    host.open_dm_channel(REPORTER_DM);
    host.open_dm_channel(MODERATOR_DM);
    host.add_message(target_snapshot());

    let store = Arc::new(RecordStore::new(dir.path().join("records")).expect("store"));
    let allocator = IdAllocator::load(dir.path());
    let gate = ClassificationGate::new(Arc::new(ScriptedClassifier::new(script)));

    let mut moderators = HashSet::new();
    moderators.insert(MODERATOR);

    let ctx = Arc::new(AppContext::new(
        host.clone(),
        store,
        allocator,
        gate,
        BOT_USER,
        moderators,
        vec![GuildChannels {
            guild_id: GUILD,
            watch_channel: WATCH_CHANNEL,
            mod_channel: MOD_CHANNEL,
        }],
    ));
    let router = SessionRouter::new(ctx.clone());

    Fixture {
        host,
        ctx,
        router,
        dir,
    }
}

impl Fixture {
    /// Drive a whole DM conversation from one user.
    pub async fn dm_sequence(&self, user_id: u64, channel_id: u64, inputs: &[&str]) {
        for input in inputs {
            self.router
                .handle_dm(user_id, channel_id, input)
                .await
                .expect("DM handling failed");
        }
    }
}
