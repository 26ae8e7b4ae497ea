//! Binary entrypoint for the ransim HTTP server.
//!
//! Configuration comes from the environment; see [`ServerConfig::from_env`].

use ransim_server::config::ServerConfig;
use ransim_server::router::build_router;
use ransim_server::state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            tracing::error!("invalid configuration: {}", err);
            std::process::exit(2);
        }
    };

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(err) => {
            tracing::error!("failed to initialize application state: {}", err);
            std::process::exit(1);
        }
    };

    let app = build_router(state);
    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!(store = ?config.store, "ransim server starting on {}", addr);

    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("failed to bind {}: {}", addr, err);
            std::process::exit(1);
        }
    };
    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("server error: {}", err);
    }
}
