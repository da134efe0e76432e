//! Exporter configuration.
//!
//! Values come from the command line or the environment; parsing lives in
//! the binary. This module holds the resolved settings and their checks.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_COLLECT_INTERVAL_SECS: u64 = 30;
pub const DEFAULT_METRIC_NAMESPACE: &str = "transmission";
pub const DEFAULT_TRANSMISSION_HOST: &str = "localhost";
pub const DEFAULT_TRANSMISSION_PORT: u16 = 9091;
pub const DEFAULT_RPC_PATH: &str = "/transmission/rpc";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_LISTEN_PORT: u16 = 8000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("collect interval must be at least one second")]
    ZeroInterval,

    #[error("rpc timeout must be at least one second")]
    ZeroTimeout,

    #[error("metric namespace must not be empty")]
    EmptyNamespace,

    #[error("rpc path must start with '/': {0}")]
    RelativeRpcPath(String),
}

/// Username/password forwarded to the daemon as HTTP Basic auth.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    /// Credentials are only used when both halves are set.
    pub fn from_parts(username: Option<String>, password: Option<String>) -> Option<Self> {
        match (username, password) {
            (Some(username), Some(password)) => Some(Self { username, password }),
            _ => None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Log output format for the binary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Where and how to reach the daemon's RPC endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcEndpoint {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub credentials: Option<Credentials>,
    pub timeout: Duration,
}

impl RpcEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: DEFAULT_RPC_PATH.to_string(),
            credentials: None,
            timeout: Duration::from_secs(DEFAULT_RPC_TIMEOUT_SECS),
        }
    }

    pub fn with_credentials(mut self, credentials: Option<Credentials>) -> Self {
        self.credentials = credentials;
        self
    }

    /// `http://host:port/path`
    pub fn url(&self) -> String {
        format!("http://{}:{}{}", self.host, self.port, self.path)
    }
}

/// Fully resolved exporter settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExporterConfig {
    pub collect_interval: Duration,
    pub metric_namespace: String,
    pub rpc: RpcEndpoint,
    pub listen_port: u16,
    pub log_format: LogFormat,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            collect_interval: Duration::from_secs(DEFAULT_COLLECT_INTERVAL_SECS),
            metric_namespace: DEFAULT_METRIC_NAMESPACE.to_string(),
            rpc: RpcEndpoint::new(DEFAULT_TRANSMISSION_HOST, DEFAULT_TRANSMISSION_PORT),
            listen_port: DEFAULT_LISTEN_PORT,
            log_format: LogFormat::Text,
        }
    }
}

impl ExporterConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.collect_interval.is_zero() {
            return Err(ConfigError::ZeroInterval);
        }
        if self.rpc.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.metric_namespace.trim().is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }
        if !self.rpc.path.starts_with('/') {
            return Err(ConfigError::RelativeRpcPath(self.rpc.path.clone()));
        }
        Ok(())
    }
}
