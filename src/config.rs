//! # Bridge Configuration Module
//!
//! This module defines the process configuration for the bridge: the three
//! required Telegram credentials plus the tunables with sensible defaults.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

// Constants for bridge configuration
pub const DEFAULT_SESSION_PATH: &str = "./session_data.json";
pub const DEFAULT_GATEWAY_URL: &str = "http://127.0.0.1:8080";
pub const DEFAULT_DC_ID: u32 = 2;
pub const CODE_WAIT_SECS: u64 = 60;

/// Errors raised while reading configuration at startup
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("missing required setting {0}; set it in the environment or in .env")]
    Missing(&'static str),
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Settings that shape the login and group flows
#[derive(Debug, Clone)]
pub struct FlowSettings {
    /// Maximum time a login waits for the verification code
    pub code_wait: Duration,
    /// Optional footer appended to the "group created" reply
    pub promo_text: Option<String>,
}

impl Default for FlowSettings {
    fn default() -> Self {
        Self {
            code_wait: Duration::from_secs(CODE_WAIT_SECS),
            promo_text: None,
        }
    }
}

/// Configuration structure for the whole process
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// User-account API identifier
    pub api_id: i32,
    /// User-account API secret
    pub api_hash: String,
    /// Bot token from @BotFather
    pub bot_token: String,
    /// Where the signed-in session is persisted
    pub session_path: PathBuf,
    /// Base URL of the MTProto gateway
    pub gateway_url: String,
    /// Data-center used until the server asks for a migration
    pub default_dc: u32,
    pub flow: FlowSettings,
}

impl BridgeConfig {
    /// Read configuration from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        let vars: HashMap<String, String> = env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Build configuration from an explicit variable map
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let api_id = required(vars, "API_ID")?
            .parse::<i32>()
            .map_err(|e| ConfigError::Invalid {
                key: "API_ID",
                reason: e.to_string(),
            })?;
        let api_hash = required(vars, "API_HASH")?;
        let bot_token = required(vars, "BOT_TOKEN")?;

        let default_dc = match optional(vars, "DEFAULT_DC") {
            Some(raw) => raw.parse::<u32>().map_err(|e| ConfigError::Invalid {
                key: "DEFAULT_DC",
                reason: e.to_string(),
            })?,
            None => DEFAULT_DC_ID,
        };

        Ok(Self {
            api_id,
            api_hash,
            bot_token,
            session_path: optional(vars, "SESSION_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_SESSION_PATH)),
            gateway_url: optional(vars, "USER_API_GATEWAY")
                .unwrap_or_else(|| DEFAULT_GATEWAY_URL.to_string()),
            default_dc,
            flow: FlowSettings {
                promo_text: optional(vars, "PROMO_TEXT"),
                ..FlowSettings::default()
            },
        })
    }
}

fn optional(vars: &HashMap<String, String>, key: &str) -> Option<String> {
    vars.get(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(vars: &HashMap<String, String>, key: &'static str) -> Result<String, ConfigError> {
    optional(vars, key).ok_or(ConfigError::Missing(key))
}
