// src/main.rs
//
// =============================================================================
// RENDER-MANAGER: ENTRY POINT (v 0.1)
// =============================================================================
//
// Wiring center: builds the shared coordinator state, binds the Dispatch
// API, spawns the ~1 Hz background ticker, opens the dashboard in the
// host's default browser, and waits on Ctrl-C. No subcommands, no flags -
// see config.rs for why.

use anyhow::{Context, Result};
use render_manager::{new_shared_state, ManagerConfig};
use std::io::Write;
use std::time::Duration;
use tokio::signal;
use tokio::time::interval;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format(|buf, record| writeln!(buf, "[{}] {}", record.level(), record.args()))
        .init();

    let config = ManagerConfig::default();
    let bind_addr = config.bind_addr;
    let tick_interval = config.tick_interval;

    let state = new_shared_state(config);

    {
        let mut guard = state.lock().await;
        guard
            .observability
            .log_activity("Render Manager started".to_string());
    }

    let ticker_state = state.clone();
    tokio::spawn(async move {
        let mut ticker = interval(tick_interval);
        loop {
            ticker.tick().await;
            let mut guard = ticker_state.lock().await;
            guard.tick(std::time::Instant::now());
        }
    });

    let browser_port = bind_addr.port();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(1)).await;
        let url = format!("http://localhost:{browser_port}/");
        if let Err(e) = webbrowser::open(&url) {
            log::warn!("Failed to auto-open dashboard at {url}: {e}");
        }
    });

    let app = render_manager::http::router(state);
    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;

    log::info!("Render Manager listening on http://{bind_addr}");

    let shutdown = async {
        signal::ctrl_c().await.ok();
        log::warn!("Interrupt received, shutting down");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .context("server error")?;

    Ok(())
}
