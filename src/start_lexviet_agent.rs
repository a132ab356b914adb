//! Startup helpers for the Lexviet agent server.

use std::process::ExitCode;
use std::sync::Arc;

use crate::server::{self, AppState, DEFAULT_PORT};
use crate::storage::{FileSlotStore, StorageResult, StorageSlot};

/// Run the server (used by the `lexviet-server` binary).
///
/// # Returns
/// `ExitCode::SUCCESS` on graceful shutdown, `1` on failure.
#[must_use]
pub fn run() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    tracing::info!("Starting Lexviet agent v{}", env!("CARGO_PKG_VERSION"));

    let slot = match build_slot() {
        Ok(slot) => slot,
        Err(e) => {
            tracing::error!("Failed to open storage: {e}");
            return ExitCode::from(1);
        }
    };

    let state = AppState::new(slot);
    let port = get_port();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            tracing::error!("Failed to create runtime: {e}");
            return ExitCode::from(1);
        }
    };

    if let Err(e) = rt.block_on(server::run_server(state, port)) {
        tracing::error!("Server error: {e}");
        return ExitCode::from(1);
    }

    ExitCode::SUCCESS
}

/// Storage backend from the environment: `LEXVIET_DATA_DIR` overrides the
/// platform data directory.
fn build_slot() -> StorageResult<Arc<dyn StorageSlot>> {
    let store = match std::env::var("LEXVIET_DATA_DIR") {
        Ok(dir) => FileSlotStore::new(dir)?,
        Err(_) => FileSlotStore::open_default()?,
    };
    tracing::info!("Conversation storage at {}", store.dir().display());
    Ok(Arc::new(store))
}

/// Port from `LEXVIET_PORT`, falling back to the default.
fn get_port() -> u16 {
    std::env::var("LEXVIET_PORT")
        .ok()
        .and_then(|raw| raw.parse().ok())
        .unwrap_or(DEFAULT_PORT)
}
