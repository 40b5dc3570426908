//! Application identity, environment variable names, and defaults.

pub const APP_NAME_LOWER: &str = "broker";

pub const ENV_HOST: &str = "BROKER_HOST";
pub const ENV_PORT: &str = "BROKER_PORT";
pub const ENV_LOG: &str = "BROKER_LOG";
pub const ENV_MAX_SUBSCRIBER_QUEUE_SIZE: &str = "BROKER_MAX_SUBSCRIBER_QUEUE_SIZE";
pub const ENV_TOPIC_HISTORY_SIZE: &str = "BROKER_TOPIC_HISTORY_SIZE";
pub const ENV_OVERFLOW_POLICY: &str = "BROKER_OVERFLOW_POLICY";
pub const ENV_SHUTDOWN_DRAIN_MS: &str = "BROKER_SHUTDOWN_DRAIN_MS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 7420;
pub const DEFAULT_SHUTDOWN_DRAIN_MS: u64 = 2000;
