use anyhow::Context;
use tracing_subscriber::EnvFilter;

use chat_room::{app, utils::sweep, Config, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg   = Config::from_env().context("reading configuration")?;
    let store = Store::open(&cfg.database_url)
        .await
        .with_context(|| format!("opening {}", cfg.database_url))?;

    tokio::spawn(sweep::task(store.clone(), cfg.sweep_every, cfg.stale_after));  // inactivity sweeper

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", cfg.port)).await?;
    tracing::info!("Server is listening on port {}.", cfg.port);
    axum::serve(listener, app(store))
        .with_graceful_shutdown(shutdown())
        .await?;
    Ok(())
}

async fn shutdown() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}
