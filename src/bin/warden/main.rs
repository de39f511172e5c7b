use anyhow::Context;
use env_logger::Env;
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::Arc;
use warden::app_config::AppConfig;
use warden::chat::local::LocalChatHost;
use warden::classifier::heuristic::HeuristicClassifier;
use warden::classifier::openai::OpenAiClassifier;
use warden::classifier::Classifier;
use warden::context::{AppContext, GuildChannels};
use warden::gate::ClassificationGate;
use warden::records::counter::IdAllocator;
use warden::records::store::RecordStore;
use warden::router::SessionRouter;

mod console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_lib_mods();

    let config = AppConfig::load().context("Failed to load configuration")?;
    let moderators = load_moderators(&config.bot.mods_path);

    let data_path = PathBuf::from(&config.storage.data_path);
    let store = Arc::new(RecordStore::new(data_path.clone()).context("Record store failed")?);
    let allocator = IdAllocator::load(&data_path);

    let classifier: Arc<dyn Classifier> = match config.classifier.provider.as_str() {
        "openai" if !config.classifier.api_key.is_empty() => Arc::new(OpenAiClassifier::new(
            config.classifier.api_key.clone(),
            config.classifier.model.clone(),
        )),
        "openai" => {
            log::warn!("Classifier provider is openai but no API key is set; using heuristic");
            Arc::new(heuristic_from(&config))
        }
        _ => Arc::new(heuristic_from(&config)),
    };
    let gate = ClassificationGate::new(classifier);

    // The platform connection is a capability; the console harness drives the
    // engine through an in-memory host seeded from the configured guilds.
    let host = Arc::new(LocalChatHost::new());
    let guilds: Vec<GuildChannels> = config
        .guilds
        .iter()
        .map(|g| GuildChannels {
            guild_id: g.guild_id,
            watch_channel: g.watch_channel,
            mod_channel: g.mod_channel,
        })
        .collect();
    for guild in &guilds {
        host.add_channel(guild.guild_id, guild.watch_channel);
        host.add_channel(guild.guild_id, guild.mod_channel);
    }

    let ctx = Arc::new(AppContext::new(
        host.clone(),
        store,
        allocator,
        gate,
        config.bot.user_id,
        moderators,
        guilds,
    ));
    let router = SessionRouter::new(ctx.clone());

    console::run(&router, &host, &config).await?;

    ctx.shutdown();
    Ok(())
}

/// Initialize third party crates we rely on but don't have control over.
fn init_lib_mods() {
    // A missing .env file is fine; environment variables still apply.
    let _ = dotenv::dotenv();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
}

/// Load the moderator roster (JSON map of name -> user id).
///
/// A missing or unreadable roster means no recognized moderators, not a
/// failed start.
fn load_moderators(path: &str) -> HashSet<u64> {
    match std::fs::read(path) {
        Ok(bytes) => match serde_json::from_slice::<HashMap<String, u64>>(&bytes) {
            Ok(map) => {
                log::info!("Loaded {} moderator(s) from {}", map.len(), path);
                map.into_values().collect()
            }
            Err(e) => {
                log::warn!("Moderator roster {} is unreadable ({}); starting with none", path, e);
                HashSet::new()
            }
        },
        Err(e) => {
            log::warn!("Moderator roster {} not found ({}); starting with none", path, e);
            HashSet::new()
        }
    }
}

fn heuristic_from(config: &AppConfig) -> HeuristicClassifier {
    HeuristicClassifier::new(
        config.classifier.maybe_threshold,
        config.classifier.flag_threshold,
    )
}
