mod ai;
mod app;
mod categories;
mod config;
mod domain;
mod http;
mod infrastructure;
mod relay;

use anyhow::Result;
use infrastructure::{directories, logging, shutdown};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let config = config::load_config()?;
    let paths = directories::ensure_directories(&config.directories)?;
    logging::init_tracing(&config, &paths)?;

    let (shutdown, _) = shutdown::Shutdown::new();
    shutdown.listen_for_signals();

    let app = app::RelayApp::initialize(config, paths, shutdown).await?;
    app.run().await
}
