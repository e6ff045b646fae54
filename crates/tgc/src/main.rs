use std::sync::Arc;

use tgc_core::config::{BackendKind, Config};
use tgc_core::directory::DirectoryStore;
use tgc_core::store::SqliteDirectoryStore;
use tgc_core::telegram::memory::{MemoryBackend, MemoryConnector};
use tgc_core::telegram::port::TelegramConnector;
use tgc_http::AppState;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), tgc_core::Error> {
    tgc_core::logging::init("tgc")?;

    let cfg = Arc::new(Config::load()?);

    let store: Arc<dyn DirectoryStore> = Arc::new(SqliteDirectoryStore::open(&cfg.db_path)?);
    let connector: Arc<dyn TelegramConnector> = match cfg.backend {
        BackendKind::Memory => Arc::new(MemoryConnector::new(MemoryBackend::new())),
    };

    info!(
        bind = %cfg.bind_addr,
        db = %cfg.db_path.display(),
        backend = ?cfg.backend,
        directory_sync = cfg.directory_chat.is_some(),
        "starting comment placement service"
    );

    tgc_http::serve(AppState::new(connector, store, cfg.clone()), &cfg.bind_addr)
        .await
        .map_err(|e| tgc_core::Error::Transport(format!("http server failed: {e}")))?;

    Ok(())
}
