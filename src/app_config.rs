//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with WARDEN_)
//! 2. Config file (warden.toml)
//! 3. Default values
//!
//! Secrets like the classifier API key should be kept in environment
//! variables, not in the config file.

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

/// Bot identity and bootstrap files
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// The bot's own platform user id; filer of automated reports
    pub user_id: u64,
    /// Path to the moderator roster (JSON map of name -> user id)
    pub mods_path: String,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            user_id: 0,
            mods_path: "mods.json".to_string(),
        }
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding record documents and the counter checkpoint
    pub data_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_path: "./data".to_string(),
        }
    }
}

/// Classifier configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Provider: "heuristic", or "openai" (requires an API key)
    pub provider: String,
    /// Model name for the hosted provider
    pub model: String,
    /// API key (should be in env var WARDEN_CLASSIFIER_API_KEY)
    #[serde(default)]
    pub api_key: String,
    /// Heuristic score at which a message is maybe-flagged
    pub maybe_threshold: f32,
    /// Heuristic score at which a message is flagged outright
    pub flag_threshold: f32,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            provider: "heuristic".to_string(),
            model: "gpt-4".to_string(),
            api_key: String::new(),
            maybe_threshold: 0.35,
            flag_threshold: 0.7,
        }
    }
}

/// One monitored guild: where to watch and where to escalate
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GuildConfig {
    pub guild_id: u64,
    /// Channel whose messages run through the classification gate
    pub watch_channel: u64,
    /// Channel receiving escalations and completion notices
    pub mod_channel: u64,
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub bot: BotConfig,
    pub storage: StorageConfig,
    pub classifier: ClassifierConfig,
    pub guilds: Vec<GuildConfig>,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("warden.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            // Start with defaults
            .add_source(config::Config::try_from(&AppConfig::default())?)
            // Add config file (optional)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // Override with environment variables (WARDEN_ prefix)
            // e.g., WARDEN_CLASSIFIER_API_KEY, WARDEN_STORAGE_DATA_PATH
            .add_source(
                Environment::with_prefix("WARDEN")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
