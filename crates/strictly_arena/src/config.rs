//! Server configuration.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use strictly_rules::{FirstFreePolicy, HeuristicPolicy, MovePolicy};
use tracing::{debug, info, instrument, warn};

/// Environment variable overriding the bind host.
pub const HOST_ENV: &str = "STRICTLY_ARENA_HOST";

/// Environment variable overriding the bind port.
pub const PORT_ENV: &str = "STRICTLY_ARENA_PORT";

/// Which move policy drives the automated seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum PolicyKind {
    /// Win, block, centre, random.
    #[default]
    Heuristic,
    /// First free cell in row-major order.
    FirstFree,
}

impl PolicyKind {
    /// Builds the policy.
    pub fn build(self) -> Arc<dyn MovePolicy> {
        match self {
            PolicyKind::Heuristic => Arc::new(HeuristicPolicy),
            PolicyKind::FirstFree => Arc::new(FirstFreePolicy),
        }
    }
}

/// Configuration for the session server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Per-observer delivery buffer, in messages.
    #[serde(default = "default_subscriber_buffer")]
    subscriber_buffer: usize,

    /// Policy for the automated seat.
    #[serde(default)]
    policy: PolicyKind,

    /// Per-request deadline, in seconds.
    #[serde(default = "default_request_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_subscriber_buffer() -> usize {
    16
}

fn default_request_timeout_secs() -> u64 {
    60
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            subscriber_buffer: default_subscriber_buffer(),
            policy: PolicyKind::default(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies `STRICTLY_ARENA_HOST` / `STRICTLY_ARENA_PORT` when set.
    #[instrument(skip(self))]
    pub fn with_env(mut self) -> Result<Self, ConfigError> {
        if let Ok(host) = std::env::var(HOST_ENV) {
            debug!(%host, "Host overridden by environment");
            self.host = host;
        }
        if let Ok(port) = std::env::var(PORT_ENV) {
            self.port = port.parse().map_err(|e| {
                warn!(%port, "Invalid port in environment");
                ConfigError::new(format!("{} must be a port number: {}", PORT_ENV, e))
            })?;
        }
        Ok(self)
    }

    /// Applies command-line overrides.
    pub fn with_overrides(
        mut self,
        host: Option<String>,
        port: Option<u16>,
        policy: Option<PolicyKind>,
    ) -> Self {
        if let Some(host) = host {
            self.host = host;
        }
        if let Some(port) = port {
            self.port = port;
        }
        if let Some(policy) = policy {
            self.policy = policy;
        }
        self
    }

    /// Returns `host:port`.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
