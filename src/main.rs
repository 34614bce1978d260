use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gym_admin::database::{members_repo, PostgrestStore, RecordStore};
use gym_admin::web::{self, AppState};
use gym_admin::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gym_admin=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 2. Config: without store credentials there is nothing to serve.
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Configuration error: {}", e);
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        build_id = env!("GYM_ADMIN_BUILD_ID"),
        store = %config.store.url,
        "Starting gym admin"
    );

    // 3. Store client, built once and shared.
    let store: Arc<dyn RecordStore> = Arc::new(PostgrestStore::new(&config.store)?);
    match members_repo::probe(store.as_ref()).await {
        Ok(()) => info!("Store reachable"),
        Err(e) => warn!("Store not reachable at startup, pages will report it: {}", e),
    }

    let app = web::router(AppState::new(store, config.delete_confirm_ttl));

    // 4. Bind, falling back to the next port if taken.
    let host = config.server.host.clone();
    let port = config.server.port;
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            let fallback_port = port.saturating_add(1);
            warn!(
                "Could not bind {}: {}. Trying fallback {}:{}",
                addr, e, host, fallback_port
            );
            let fallback: SocketAddr = format!("{}:{}", host, fallback_port).parse()?;
            tokio::net::TcpListener::bind(fallback).await?
        }
    };

    let bound_addr = listener.local_addr()?;
    info!("Server running on http://{}", bound_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
