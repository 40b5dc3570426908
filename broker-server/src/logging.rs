//! Tracing subscriber setup, grounded on the teacher's `CoreApp::init_logging`.

use crate::constants::{APP_NAME_LOWER, ENV_LOG};

pub fn init() {
    let default_filter = format!("info,{APP_NAME_LOWER}=debug");

    let filter = std::env::var(ENV_LOG)
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or(default_filter);

    tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true)
        .with_ansi(true)
        .compact()
        .with_env_filter(filter)
        .init();
}
