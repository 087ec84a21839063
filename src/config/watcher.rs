//! Config file watcher.
//!
//! Only the guard policy and the trusted header list are applied on reload.
//! Pattern lists belong to the running registry and are not re-seeded.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::IdentityConfig;

/// Sends a freshly validated [`IdentityConfig`] whenever the file changes.
pub struct ConfigWatcher {
    path: PathBuf,
    update_tx: mpsc::UnboundedSender<IdentityConfig>,
}

impl ConfigWatcher {
    /// Returns the watcher and the receiving end for validated configs.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<IdentityConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();
        let watcher = Self {
            path: path.to_path_buf(),
            update_tx,
        };
        (watcher, update_rx)
    }

    /// Start watching. The returned watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self { path, update_tx } = self;
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| {
                let event = match res {
                    Ok(event) => event,
                    Err(e) => {
                        tracing::error!(error = ?e, "Config watch error");
                        return;
                    }
                };
                if !(event.kind.is_modify() || event.kind.is_create()) {
                    return;
                }

                match load_config(&watched) {
                    Ok(config) => {
                        tracing::info!(
                            policy = config.guard.name(),
                            trusted_headers = config.resolver.trusted_headers.len(),
                            "Config changed, reloading guard policy and trusted headers"
                        );
                        if update_tx.send(config).is_err() {
                            tracing::debug!("Server gone, dropping config update");
                        }
                    }
                    Err(e) => {
                        tracing::error!(
                            error = %e,
                            "Config reload rejected, keeping current guard and resolver"
                        );
                    }
                }
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&path, RecursiveMode::NonRecursive)?;
        tracing::info!(path = %path.display(), "Watching config file");
        Ok(watcher)
    }
}
