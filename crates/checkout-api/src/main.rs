//! # Checkout Engine
//!
//! ## Usage
//!
//! ```bash
//! # Optional overrides
//! export CHECKOUT_CONFIG=config/checkout.toml
//! export CATALOG_PATH=config/catalog.toml
//! export DATA_FILE=data/store.json
//! export LOG_FORMAT=json
//!
//! # Run the server
//! checkout-engine
//! ```

use checkout_api::{routes, AppConfig, AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    init_tracing(&config);

    print_banner();

    let (state, observers) = AppState::build(&config).await?;
    let addr = config.socket_addr()?;

    info!(
        payment_types = ?state.facade.payment_factory().supported_types(),
        strategies = ?state.facade.strategy_factory().supported_strategies(),
        observers = state.facade.events().observer_count(),
        "Checkout engine ready"
    );

    let app = routes::create_router(state);

    info!("Checkout engine listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    observers.shutdown().await;
    info!("Checkout engine stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    if config.json_logs() {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

fn print_banner() {
    println!(
        r#"
  Checkout Engine RS
  ━━━━━━━━━━━━━━━━━━
  Version: {}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
