// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The supervisor: a live worker set tracking declared configuration.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::future::join_all;
use parking_lot::Mutex;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use bm_adapters::RpcConnector;
use bm_config::{
    boards_dir, diff_boards, global_changed, load_config, resolve_options, BoardConfig,
    ConfigError, GlobalConfig, MultiBoardConfig,
};
use bm_core::Clock;
use bm_engine::{AddressChangeHook, BoardWorker};

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("all boards failed to start:{}", format_failures(failures))]
    AllBoardsFailed { failures: Vec<(String, String)> },

    #[error("failed to watch {}: {source}", path.display())]
    Watch {
        path: PathBuf,
        #[source]
        source: notify::Error,
    },

    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn format_failures(failures: &[(String, String)]) -> String {
    failures
        .iter()
        .map(|(address, error)| format!("\n  {address}: {error}"))
        .collect()
}

/// Drives the worker set. Cheap to clone; clones share the same state.
pub struct Supervisor<C: Clock> {
    shared: Arc<Shared>,
    connector: Arc<dyn RpcConnector>,
    clock: C,
}

impl<C: Clock> std::fmt::Debug for Supervisor<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Supervisor").finish()
    }
}

struct Shared {
    config_dir: PathBuf,
    workers: Mutex<HashMap<String, BoardWorker>>,
    errors: Mutex<HashMap<String, String>>,
    applied: Mutex<MultiBoardConfig>,
    reloading: AtomicBool,
    stopped: AtomicBool,
    watcher_cancel: CancellationToken,
}

impl<C: Clock> Clone for Supervisor<C> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            connector: Arc::clone(&self.connector),
            clock: self.clock.clone(),
        }
    }
}

impl<C: Clock + 'static> Supervisor<C> {
    /// Load the configuration and start a worker per declared board,
    /// sequentially. Per-board failures are recorded; only a fully failed
    /// startup (no worker running, at least one error) is fatal.
    pub async fn start(
        config_dir: PathBuf,
        connector: Arc<dyn RpcConnector>,
        clock: C,
    ) -> Result<Self, SupervisorError> {
        let config = load_config(&config_dir)?;
        let supervisor = Self {
            shared: Arc::new(Shared {
                config_dir,
                workers: Mutex::new(HashMap::new()),
                errors: Mutex::new(HashMap::new()),
                applied: Mutex::new(config.clone()),
                reloading: AtomicBool::new(false),
                stopped: AtomicBool::new(false),
                watcher_cancel: CancellationToken::new(),
            }),
            connector,
            clock,
        };

        for board in &config.boards {
            supervisor.start_board(board, &config.global).await;
        }

        let started = supervisor.shared.workers.lock().len();
        let failures = supervisor.start_errors();
        if started == 0 && !failures.is_empty() {
            return Err(SupervisorError::AllBoardsFailed { failures });
        }

        info!(
            boards = started,
            failed = failures.len(),
            "supervisor started"
        );
        Ok(supervisor)
    }

    pub fn config_dir(&self) -> &Path {
        &self.shared.config_dir
    }

    /// Per-board startup/reconcile failures, sorted by address.
    pub fn start_errors(&self) -> Vec<(String, String)> {
        let mut failures: Vec<(String, String)> = self
            .shared
            .errors
            .lock()
            .iter()
            .map(|(address, error)| (address.clone(), error.clone()))
            .collect();
        failures.sort();
        failures
    }

    /// Addresses of currently running workers, sorted.
    pub fn worker_addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self.shared.workers.lock().keys().cloned().collect();
        addresses.sort();
        addresses
    }

    /// Watch the configuration tree and reconcile on debounced changes.
    pub fn spawn_watcher(&self) -> Result<(), SupervisorError> {
        crate::watcher::spawn(self.clone())
    }

    pub(crate) fn watcher_cancel(&self) -> CancellationToken {
        self.shared.watcher_cancel.clone()
    }

    /// Reload config and drive the worker set to it. Reentrant calls and
    /// calls after shutdown are ignored; a config that fails validation
    /// skips the cycle and keeps the current set running.
    pub async fn reconcile(&self) {
        if self.shared.stopped.load(Ordering::SeqCst) {
            return;
        }
        if self.shared.reloading.swap(true, Ordering::SeqCst) {
            return;
        }
        self.reconcile_inner().await;
        self.shared.reloading.store(false, Ordering::SeqCst);
    }

    async fn reconcile_inner(&self) {
        let new_config = match load_config(&self.shared.config_dir) {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "config reload failed, keeping current worker set");
                return;
            }
        };
        let old_config = self.shared.applied.lock().clone();

        let mut diff = diff_boards(&old_config.boards, &new_config.boards);
        if global_changed(&old_config.global, &new_config.global) {
            // A global change restarts every surviving board.
            let changed: HashSet<String> =
                diff.changed.iter().map(|b| b.address.clone()).collect();
            let added: HashSet<String> = diff.added.iter().map(|b| b.address.clone()).collect();
            for board in &new_config.boards {
                if !changed.contains(&board.address)
                    && !added.contains(&board.address)
                    && old_config.board(&board.address).is_some()
                {
                    diff.changed.push(board.clone());
                }
            }
        }

        if diff.is_empty() {
            *self.shared.applied.lock() = new_config;
            return;
        }

        info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            changed = diff.changed.len(),
            "applying configuration change"
        );

        for address in &diff.removed {
            self.stop_board(address).await;
            self.shared.errors.lock().remove(address);
        }
        for board in &diff.changed {
            self.stop_board(&board.address).await;
            self.start_board(board, &new_config.global).await;
        }
        for board in &diff.added {
            self.start_board(board, &new_config.global).await;
        }

        *self.shared.applied.lock() = new_config;
    }

    async fn start_board(&self, board: &BoardConfig, global: &GlobalConfig) {
        let options = resolve_options(board, global, &self.shared.config_dir);
        let hook = self.address_change_hook();
        match BoardWorker::start(options, self.connector.as_ref(), self.clock.clone(), hook).await
        {
            Ok(worker) => {
                self.shared
                    .workers
                    .lock()
                    .insert(board.address.clone(), worker);
                self.shared.errors.lock().remove(&board.address);
            }
            Err(e) => {
                warn!(board = %board.address, error = %e, "board failed to start");
                self.shared
                    .errors
                    .lock()
                    .insert(board.address.clone(), e.to_string());
            }
        }
    }

    async fn stop_board(&self, address: &str) {
        let worker = self.shared.workers.lock().remove(address);
        match worker {
            Some(worker) => {
                if let Err(e) = worker.stop().await {
                    warn!(board = %address, error = %e, "worker stop failed");
                    self.shared
                        .errors
                        .lock()
                        .insert(address.to_string(), e.to_string());
                }
            }
            None => debug!(board = %address, "no running worker to stop"),
        }
    }

    /// Capability handed to each worker: rename the board's directory and
    /// re-key the worker map when the RPC renames the board.
    fn address_change_hook(&self) -> AddressChangeHook {
        let shared = Arc::clone(&self.shared);
        Arc::new(move |old_address: &str, new_address: &str| {
            let boards = boards_dir(&shared.config_dir);
            std::fs::rename(boards.join(old_address), boards.join(new_address))?;
            let mut workers = shared.workers.lock();
            if let Some(worker) = workers.remove(old_address) {
                workers.insert(new_address.to_string(), worker);
            }
            info!(
                old = %old_address,
                new = %new_address,
                "board directory renamed for address migration"
            );
            Ok(())
        })
    }

    /// Shut everything down: cancel the watcher, stop all workers
    /// concurrently, log (never raise) stop-time failures.
    pub async fn stop(&self) {
        self.shared.stopped.store(true, Ordering::SeqCst);
        self.shared.watcher_cancel.cancel();

        let workers: Vec<(String, BoardWorker)> =
            self.shared.workers.lock().drain().collect();
        let results = join_all(workers.into_iter().map(|(address, worker)| async move {
            (address, worker.stop().await)
        }))
        .await;

        for (address, result) in results {
            if let Err(e) = result {
                warn!(board = %address, error = %e, "worker stop failed during shutdown");
            }
        }
        info!("supervisor stopped");
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
