//! Application configuration: CLI flags (each with an `env` fallback,
//! resolved by `clap` itself) layered over hardcoded defaults.
//!
//! Grounded on the teacher's `AppConfig`/`ServerConfig` split, simplified to
//! drop the config-file layer the teacher supports: this broker's surface
//! is small enough that CLI + env is the whole story.

use broker_core::BrokerConfig;

use crate::cli::Cli;
use crate::constants::{DEFAULT_HOST, DEFAULT_PORT, DEFAULT_SHUTDOWN_DRAIN_MS};

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub broker: BrokerConfig,
    pub shutdown_drain_ms: u64,
}

impl AppConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let defaults = BrokerConfig::default();

        Self {
            server: ServerConfig {
                host: cli.host.unwrap_or_else(|| DEFAULT_HOST.to_string()),
                port: cli.port.unwrap_or(DEFAULT_PORT),
            },
            broker: BrokerConfig {
                max_subscriber_queue_size: cli
                    .max_subscriber_queue_size
                    .unwrap_or(defaults.max_subscriber_queue_size),
                topic_history_size: cli
                    .topic_history_size
                    .unwrap_or(defaults.topic_history_size),
                overflow_policy: cli.overflow_policy.unwrap_or(defaults.overflow_policy),
            },
            shutdown_drain_ms: cli.shutdown_drain_ms.unwrap_or(DEFAULT_SHUTDOWN_DRAIN_MS),
        }
    }
}
