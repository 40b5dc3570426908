//! Application wiring, grounded on the teacher's `CoreApp::run`/`init`/
//! `start_server` sequence.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use broker_core::{Broker, ShutdownService};

use crate::cli;
use crate::config::AppConfig;
use crate::logging;

pub struct App {
    pub config: AppConfig,
    pub broker: Arc<Broker>,
    pub shutdown: ShutdownService,
}

impl App {
    pub async fn run() -> Result<()> {
        logging::init();
        tracing::debug!("broker starting");

        let cli = cli::parse();
        let config = AppConfig::from_cli(cli);
        tracing::trace!(?config, "resolved configuration");

        let app = Self::init(config);
        Self::start(app).await
    }

    fn init(config: AppConfig) -> Self {
        let broker = Arc::new(Broker::new(config.broker.clone()));
        let shutdown = ShutdownService::new(
            Arc::clone(&broker),
            Duration::from_millis(config.shutdown_drain_ms),
        );

        Self {
            config,
            broker,
            shutdown,
        }
    }

    async fn start(app: Self) -> Result<()> {
        app.shutdown.install_signal_handlers();

        let addr = SocketAddr::new(app.config.server.host.parse()?, app.config.server.port);
        let shutdown = app.shutdown.clone();

        // The drain sequence runs as soon as the trigger fires rather than
        // after `serve` returns: `serve` itself only returns once every
        // connection handler has exited, and those handlers exit because
        // they observe this same trigger, so the two must run side by side.
        let drain = {
            let shutdown = shutdown.clone();
            tokio::spawn(async move {
                shutdown.wait().await;
                shutdown.shutdown().await;
            })
        };

        crate::api::serve(addr, app.broker, shutdown).await?;
        drain.await?;

        Ok(())
    }
}
