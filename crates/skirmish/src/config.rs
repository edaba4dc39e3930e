//! Server configuration.
//!
//! Defaults work out of the box. A few values can be overridden through
//! environment variables:
//!
//! - `SKIRMISH_BIND_ADDR`       (default: "0.0.0.0:8080")
//! - `SKIRMISH_MAX_FRAME_SIZE`  (default: "1024")
//! - `SKIRMISH_QUEUE_CAPACITY`  (default: "64")
//! - `SKIRMISH_MAX_TURNS`       (default: "20")
//! - `SKIRMISH_HANDSHAKE_TIMEOUT_MS` (default: "5000")

use std::env;
use std::str::FromStr;
use std::time::Duration;

use skirmish_hub::HubConfig;
use skirmish_transport::{DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_MAX_FRAME_SIZE};

use crate::SkirmishError;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

/// Everything needed to start a server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the WebSocket listener binds to.
    pub bind_addr: String,

    /// Largest inbound message accepted, in bytes. Bigger messages end
    /// the session.
    pub max_frame_size: usize,

    /// How long a new peer may take to complete the WebSocket upgrade
    /// before it is dropped.
    pub handshake_timeout: Duration,

    /// Queue sizes and game rules.
    pub hub: HubConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            max_frame_size: DEFAULT_MAX_FRAME_SIZE,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            hub: HubConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Reads overrides from the process environment.
    ///
    /// # Errors
    /// [`SkirmishError::Config`] if a variable is set but does not parse.
    pub fn from_env() -> Result<Self, SkirmishError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env), reading variables through
    /// `lookup` instead.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SkirmishError> {
        let mut config = Self::default();
        if let Some(addr) = lookup("SKIRMISH_BIND_ADDR") {
            config.bind_addr = addr;
        }
        config.max_frame_size =
            read_or_default(&lookup, "SKIRMISH_MAX_FRAME_SIZE", config.max_frame_size)?;
        config.hub.queue_capacity =
            read_or_default(&lookup, "SKIRMISH_QUEUE_CAPACITY", config.hub.queue_capacity)?;
        config.hub.game.max_turns =
            read_or_default(&lookup, "SKIRMISH_MAX_TURNS", config.hub.game.max_turns)?;
        let handshake_ms = read_or_default(
            &lookup,
            "SKIRMISH_HANDSHAKE_TIMEOUT_MS",
            config.handshake_timeout.as_millis() as u64,
        )?;
        config.handshake_timeout = Duration::from_millis(handshake_ms);
        Ok(config)
    }
}

fn read_or_default<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, SkirmishError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(val) => val.trim().parse::<T>().map_err(|e| SkirmishError::Config {
            key: key.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}
