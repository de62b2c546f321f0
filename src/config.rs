use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::network::ReconnectPolicy;

pub const DEFAULT_CONFIG_PATH: &str = "config/chat.json";

/// Environment override for the realtime channel URL.
pub const WS_URL_ENV: &str = "CHAT_WS_URL";
/// Environment override for the fallback endpoint base URL.
pub const API_URL_ENV: &str = "CHAT_API_URL";

fn default_ws_url() -> String {
    "ws://localhost:3001".to_string()
}

fn default_api_url() -> String {
    "http://localhost:3001/api".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_ws_url")]
    pub ws_url: String,
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub reconnect: ReconnectPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            ws_url: default_ws_url(),
            api_url: default_api_url(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

pub fn load_config(path: &str) -> AppConfig {
    let path = Path::new(path);
    let mut config = match fs::read_to_string(path) {
        Ok(content) => match serde_json::from_str::<AppConfig>(&content) {
            Ok(config) => config,
            Err(err) => {
                log::warn!("Failed to parse config file {}: {err}", path.display());
                AppConfig::default()
            }
        },
        Err(err) => {
            log::info!(
                "Config file {} not found ({err}); using defaults",
                path.display()
            );
            AppConfig::default()
        }
    };
    apply_env_overrides(&mut config);
    config
}

/// Environment variables win over the config file.
fn apply_env_overrides(config: &mut AppConfig) {
    if let Ok(url) = env::var(WS_URL_ENV) {
        config.ws_url = url;
    }
    if let Ok(url) = env::var(API_URL_ENV) {
        config.api_url = url;
    }
}
