use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{AppError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_db_path")]
    pub db_path: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Base URL of the external identity provider (Supabase-style auth API).
    #[serde(default = "default_identity_url")]
    pub identity_url: String,

    pub identity_anon_key: Option<String>,

    /// Name of the session cookie carrying the provider's access token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    #[serde(default = "default_feed_limit")]
    pub default_feed_limit: usize,

    #[serde(default = "default_leaderboard_limit")]
    pub default_leaderboard_limit: usize,
}

fn default_db_path() -> String {
    let data_dir = dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tilt");
    std::fs::create_dir_all(&data_dir).ok();
    data_dir.join("tilt.db").to_string_lossy().to_string()
}

fn default_port() -> u16 {
    3001
}

fn default_identity_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_session_cookie() -> String {
    "sb-access-token".to_string()
}

fn default_feed_limit() -> usize {
    5
}

fn default_leaderboard_limit() -> usize {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: default_port(),
            identity_url: default_identity_url(),
            identity_anon_key: None,
            session_cookie: default_session_cookie(),
            default_feed_limit: default_feed_limit(),
            default_leaderboard_limit: default_leaderboard_limit(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path();
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tilt")
            .join("config.toml")
    }
}
