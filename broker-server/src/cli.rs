//! Command-line interface, grounded on the teacher's `clap` derive pattern:
//! every knob is a global `Option<T>` flag with a matching `env` fallback,
//! so CLI args and environment variables resolve through one `clap::Parser`
//! without a separate merge step.

use clap::Parser;

use broker_core::OverflowPolicy;

use crate::constants::{
    ENV_HOST, ENV_MAX_SUBSCRIBER_QUEUE_SIZE, ENV_OVERFLOW_POLICY, ENV_PORT,
    ENV_SHUTDOWN_DRAIN_MS, ENV_TOPIC_HISTORY_SIZE,
};

#[derive(Parser, Debug)]
#[command(name = "broker")]
#[command(version, about = "In-memory pub/sub broker", long_about = None)]
pub struct Cli {
    /// Address to bind the HTTP/WebSocket listener on
    #[arg(long, short = 'H', env = ENV_HOST)]
    pub host: Option<String>,

    /// Port to bind the HTTP/WebSocket listener on
    #[arg(long, short = 'p', env = ENV_PORT)]
    pub port: Option<u16>,

    /// Per-subscriber delivery queue capacity (Q)
    #[arg(long, env = ENV_MAX_SUBSCRIBER_QUEUE_SIZE)]
    pub max_subscriber_queue_size: Option<usize>,

    /// Per-topic history ring capacity (H)
    #[arg(long, env = ENV_TOPIC_HISTORY_SIZE)]
    pub topic_history_size: Option<usize>,

    /// Overflow policy applied when a subscriber's queue is full
    #[arg(long, env = ENV_OVERFLOW_POLICY, value_parser = parse_overflow_policy)]
    pub overflow_policy: Option<OverflowPolicy>,

    /// Bounded drain window granted to delivery pumps during shutdown, in
    /// milliseconds
    #[arg(long, env = ENV_SHUTDOWN_DRAIN_MS)]
    pub shutdown_drain_ms: Option<u64>,
}

fn parse_overflow_policy(s: &str) -> Result<OverflowPolicy, String> {
    match s.to_lowercase().as_str() {
        "drop-oldest" | "drop_oldest" => Ok(OverflowPolicy::DropOldest),
        "disconnect-on-full" | "disconnect_on_full" => Ok(OverflowPolicy::DisconnectOnFull),
        _ => Err(format!(
            "invalid overflow policy '{s}'. valid options: drop-oldest, disconnect-on-full"
        )),
    }
}

pub fn parse() -> Cli {
    Cli::parse()
}
