pub mod config;
pub mod types;

pub use config::{ConfigError, Credentials, ExporterConfig, LogFormat, RpcEndpoint};
pub use types::*;
