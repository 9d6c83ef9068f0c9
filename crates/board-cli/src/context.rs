use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Context as _, Result};
use board_core::config::{Config, StoreConfig};
use board_sync::{BoardController, EntityStore, FileEntityStore, HttpEntityStore};

use crate::root;

/// A loaded board plus the runtime driving it, for one CLI invocation.
pub struct Context {
    pub board: Arc<BoardController>,
    pub rt: tokio::runtime::Runtime,
}

impl Context {
    /// Read the config, connect the store and load the board.
    pub fn open(config_path: &Path) -> Result<Self> {
        let config = Config::load(config_path)
            .with_context(|| format!("reading {}", config_path.display()))?;
        let store = open_store(&config, &root::config_dir(config_path))?;
        let rt = tokio::runtime::Runtime::new()?;
        let board = Arc::new(BoardController::new(config, store));
        let report = rt.block_on(board.load())?;
        if report.skipped > 0 {
            eprintln!("warning: skipped {} invalid record(s)", report.skipped);
        }
        Ok(Self { board, rt })
    }

    /// Print any toasts raised during this invocation to stderr.
    pub fn flush_notifications(&self) {
        for n in self.board.notifications().all() {
            eprintln!("{}", n.message);
        }
    }
}

pub fn open_store(config: &Config, base: &Path) -> Result<Arc<dyn EntityStore>> {
    match &config.store {
        StoreConfig::File { .. } => {
            let dir = config
                .store_dir(base)
                .ok_or_else(|| anyhow!("file store has no directory"))?;
            tracing::debug!(dir = %dir.display(), "using file store");
            Ok(Arc::new(FileEntityStore::new(dir)))
        }
        StoreConfig::Http {
            base_url,
            token_env,
            timeout_secs,
        } => {
            let token = match token_env {
                Some(var) => Some(
                    std::env::var(var)
                        .with_context(|| format!("environment variable {var} is not set"))?,
                ),
                None => None,
            };
            tracing::debug!(%base_url, "using http store");
            let store = HttpEntityStore::with_timeout(
                base_url.clone(),
                token,
                timeout_secs.map(Duration::from_secs),
            )?;
            Ok(Arc::new(store))
        }
    }
}
