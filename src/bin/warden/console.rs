//! Interactive console harness.
//!
//! Drives the whole engine end to end without a platform connection: stdin
//! lines become DMs or watched-channel messages against the in-memory host,
//! and everything the engine sends is echoed back per channel.

use std::sync::atomic::{AtomicU64, Ordering};
use tokio::io::{AsyncBufReadExt, BufReader};
use warden::app_config::AppConfig;
use warden::chat::local::LocalChatHost;
use warden::chat::{ChannelId, MessageRef, MessageSnapshot};
use warden::router::SessionRouter;

const USAGE: &str = "Commands:\n\
    dm <user_id> <text>           send a DM to the bot as that user\n\
    say <guild_id> <user_id> <text>  post into the guild's watched channel\n\
    quit                          flush and exit\n";

static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

/// Read commands from stdin until EOF or `quit`.
pub async fn run(
    router: &SessionRouter,
    host: &LocalChatHost,
    config: &AppConfig,
) -> anyhow::Result<()> {
    println!("warden console ready. Type `quit` to exit, or:\n{}", USAGE);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }
        if line == "quit" || line == "exit" {
            break;
        }

        let mut drains: Vec<ChannelId> = config.guilds.iter().map(|g| g.mod_channel).collect();

        if let Some(rest) = line.strip_prefix("dm ") {
            let (user_id, text) = match split_id(rest) {
                Some(parts) => parts,
                None => {
                    println!("{}", USAGE);
                    continue;
                }
            };
            // One DM channel per user, keyed by the user id itself.
            let channel_id = user_id;
            host.open_dm_channel(channel_id);
            drains.push(channel_id);
            if let Err(e) = router.handle_dm(user_id, channel_id, text).await {
                log::error!("DM handling failed: {}", e);
            }
        } else if let Some(rest) = line.strip_prefix("say ") {
            let parsed = split_id(rest).and_then(|(guild_id, rest)| {
                split_id(rest).map(|(user_id, text)| (guild_id, user_id, text))
            });
            let (guild_id, user_id, text) = match parsed {
                Some(parts) => parts,
                None => {
                    println!("{}", USAGE);
                    continue;
                }
            };
            let channel_id = match config.guilds.iter().find(|g| g.guild_id == guild_id) {
                Some(guild) => guild.watch_channel,
                None => {
                    println!("Guild {} is not configured", guild_id);
                    continue;
                }
            };
            let snapshot = MessageSnapshot {
                reference: MessageRef {
                    guild_id,
                    channel_id,
                    message_id: NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed),
                },
                author_id: user_id,
                author_name: format!("user{}", user_id),
                content: text.to_string(),
            };
            println!("(message link: {})", snapshot.reference.link());
            host.add_message(snapshot.clone());
            if let Err(e) = router.handle_guild_message(&snapshot).await {
                log::error!("Guild message handling failed: {}", e);
            }
        } else {
            println!("{}", USAGE);
            continue;
        }

        for channel_id in drains {
            for sent in host.drain_sent(channel_id) {
                println!("[#{}] {}", channel_id, sent);
            }
        }
    }
    Ok(())
}

/// Split a leading integer id off a command tail.
fn split_id(input: &str) -> Option<(u64, &str)> {
    let mut parts = input.splitn(2, ' ');
    let id = parts.next()?.parse().ok()?;
    Some((id, parts.next().unwrap_or("").trim()))
}
