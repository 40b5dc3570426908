mod api;
mod app;
mod cli;
mod config;
mod constants;
mod logging;
mod websocket;
mod wire;

use app::App;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    App::run().await
}
