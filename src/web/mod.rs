//! linehook web server: health check and webhook ingress.

pub mod config;
pub mod handlers;
pub mod router;
pub mod state;
pub mod utils;

use std::sync::Arc;

use clap::Parser;

use crate::profile::{HttpProfileResolver, ProfileLookup};
use crate::storage::{DocumentStore, SqliteStore};
use crate::tlog;

use config::{Cli, Config};
use state::{AppState, SharedState};

/// Open the store and profile client described by `config`.
///
/// A store that fails to open is logged and left as `None`; the server still
/// answers health checks and rejects webhooks with 500.
pub fn build_state(config: &Config) -> SharedState {
    let store: Option<Arc<dyn DocumentStore>> = match SqliteStore::open(&config.store_path) {
        Ok(store) => {
            tlog!("  store: {}", config.store_path.display());
            Some(Arc::new(store) as Arc<dyn DocumentStore>)
        }
        Err(e) => {
            tlog!(
                "  WARNING: failed to open store {}: {}",
                config.store_path.display(),
                e
            );
            None
        }
    };

    let resolver = HttpProfileResolver::new(
        &config.profile_api,
        config.access_token.clone(),
        config.profile_timeout,
    );
    if resolver.has_access_token() {
        tlog!("  profile API: {}", config.profile_api);
    } else {
        tlog!("  profile API: no access token configured, profile lookup disabled");
    }
    let profiles: Arc<dyn ProfileLookup> = Arc::new(resolver);

    Arc::new(AppState::new(store, profiles))
}

/// Entry point: parse CLI, open dependencies, start server.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::from_cli_and_env(cli);

    crate::logging::init();

    tlog!("linehook starting");
    let state = build_state(&config);
    let app = router::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .map_err(|e| format!("failed to bind {}: {e}", config.bind_addr))?;
    tlog!("linehook listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}
