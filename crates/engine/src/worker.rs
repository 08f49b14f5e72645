// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-board worker.
//!
//! One worker per supervised board: it owns the board's state document and
//! lock, holds the board's signer, and on every update event sweeps the
//! board through the four moderation rules (capacity archive, bump-limit
//! archive, archive purge, author-deleted purge).
//!
//! Update handling is serialized with at-most-one-pending coalescing: the
//! update channel has capacity 1 and the transport delivers notifications
//! with `try_send`, so a burst arriving mid-sweep collapses into a single
//! deferred re-run that re-fetches the board and observes everything the
//! burst announced.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use bm_adapters::{
    BoardView, ModerationRecord, Role, RpcClient, RpcConnector, RpcError, Signer,
};
use bm_core::{Clock, Thread, WorkerOptions, WorkerSettings};
use bm_storage::{load_state, save_state, ArchivedThread, BoardState, SignerEntry, StateLock,
    StorageError};

use crate::paginator;

const STATE_FILE: &str = "state.json";

/// Capability handed to the worker at start: rename the on-disk board
/// directory and re-key the supervisor's worker map when the RPC reports a
/// new address. Called with `(old, new)`; rollback inverts the arguments.
pub type AddressChangeHook = Arc<dyn Fn(&str, &str) -> std::io::Result<()> + Send + Sync>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("{address}: {source}")]
    Lock {
        address: String,
        #[source]
        source: StorageError,
    },

    #[error(transparent)]
    Rpc(#[from] RpcError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    #[error(
        "no moderator role on remote board {address}: \
         ask the board owner to grant moderator to {signer}"
    )]
    MissingModRole { address: String, signer: String },

    #[error("address migration to {new_address} failed: {message}")]
    Migration {
        new_address: String,
        message: String,
    },

    #[error("worker task failed: {0}")]
    Join(String),
}

/// Handle to a running board worker.
pub struct BoardWorker {
    address: String,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl std::fmt::Debug for BoardWorker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardWorker")
            .field("address", &self.address)
            .finish()
    }
}

impl BoardWorker {
    /// Start moderating one board.
    ///
    /// Acquires the state lock, loads state, connects the RPC, obtains the
    /// signer (recreating a persisted one), ensures the moderator role,
    /// subscribes to updates and starts the board's update stream, then
    /// spawns the sweep loop.
    pub async fn start<C: Clock + 'static>(
        options: WorkerOptions,
        connector: &dyn RpcConnector,
        clock: C,
        on_address_change: AddressChangeHook,
    ) -> Result<BoardWorker, WorkerError> {
        let settings = options.settings();
        let state_path = options.board_dir.join(STATE_FILE);

        let lock = StateLock::acquire(&state_path).map_err(|source| WorkerError::Lock {
            address: options.address.clone(),
            source,
        })?;
        let mut state = load_state(&state_path);

        let client = connector
            .connect(&options.rpc_url, &settings.user_agent)
            .await?;

        let (signer, update_rx, update_tx) =
            match Self::bootstrap(client.as_ref(), &mut state, &state_path, &options).await {
                Ok(bootstrapped) => bootstrapped,
                Err(e) => {
                    // The connection belongs to this worker; don't leak it.
                    if let Err(destroy_err) = client.destroy().await {
                        warn!(
                            board = %options.address,
                            error = %destroy_err,
                            "failed to destroy rpc connection after start failure"
                        );
                    }
                    return Err(e);
                }
            };

        let cancel = CancellationToken::new();
        let task = WorkerTask {
            address: options.address.clone(),
            board_dir: options.board_dir.clone(),
            state_path,
            settings,
            client,
            clock,
            state,
            lock,
            signer,
            purged: HashSet::new(),
            cancel: cancel.clone(),
            on_address_change,
            update_tx,
        };
        let handle = tokio::spawn(task.run(update_rx));

        info!(board = %options.address, "board worker started");
        Ok(BoardWorker {
            address: options.address,
            cancel,
            handle,
        })
    }

    async fn bootstrap(
        client: &dyn RpcClient,
        state: &mut BoardState,
        state_path: &std::path::Path,
        options: &WorkerOptions,
    ) -> Result<(Signer, mpsc::Receiver<()>, mpsc::Sender<()>), WorkerError> {
        let signer = match state.signers.get(&options.address) {
            Some(entry) => client.create_signer(Some(&entry.private_key)).await?,
            None => {
                let signer = client.create_signer(None).await?;
                state.signers.insert(
                    options.address.clone(),
                    SignerEntry {
                        private_key: signer.private_key().to_string(),
                    },
                );
                save_state(state_path, state)?;
                signer
            }
        };

        let board = client.get_board(&options.address).await?;
        ensure_moderator(client, &options.address, &board, &signer).await?;

        // Capacity 1: the coalescing buffer for update bursts.
        let (update_tx, update_rx) = mpsc::channel(1);
        client.subscribe(&options.address, update_tx.clone());
        client.start_board(&options.address).await?;

        Ok((signer, update_rx, update_tx))
    }

    /// The address this worker was started under.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Stop the worker: cancel the sweep loop and wait for the task to
    /// persist state, release the lock and tear down its connection.
    pub async fn stop(self) -> Result<(), WorkerError> {
        self.cancel.cancel();
        self.handle
            .await
            .map_err(|e| WorkerError::Join(e.to_string()))
    }
}

/// If the signer already holds a moderating role, done. If the RPC hosts
/// the board locally, self-grant moderator. A remote board without the
/// role is a fatal start error naming the human step that fixes it.
async fn ensure_moderator(
    client: &dyn RpcClient,
    address: &str,
    board: &BoardView,
    signer: &Signer,
) -> Result<(), WorkerError> {
    if board
        .roles
        .get(signer.address())
        .is_some_and(Role::grants_moderation)
    {
        return Ok(());
    }

    let hosted = client.local_boards().await?;
    if hosted.iter().any(|hosted_address| hosted_address == address) {
        let mut roles = board.roles.clone();
        roles.insert(signer.address().to_string(), Role::moderator());
        client.edit_board_roles(address, roles).await?;
        info!(board = %address, signer = %signer.address(), "granted self moderator role");
        return Ok(());
    }

    Err(WorkerError::MissingModRole {
        address: address.to_string(),
        signer: signer.address().to_string(),
    })
}

struct WorkerTask<C: Clock> {
    /// Current board address; rewritten by migration.
    address: String,
    board_dir: PathBuf,
    state_path: PathBuf,
    settings: WorkerSettings,
    client: Arc<dyn RpcClient>,
    clock: C,
    state: BoardState,
    lock: StateLock,
    signer: Signer,
    /// Cids purged this session; purges are not persisted, this keeps
    /// back-to-back sweeps of an unchanged view from republishing.
    purged: HashSet<String>,
    cancel: CancellationToken,
    on_address_change: AddressChangeHook,
    /// Kept for re-subscribing under a new address after migration.
    update_tx: mpsc::Sender<()>,
}

impl<C: Clock> WorkerTask<C> {
    async fn run(mut self, mut updates: mpsc::Receiver<()>) {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                received = updates.recv() => match received {
                    Some(()) => {
                        if let Err(e) = self.run_update().await {
                            error!(board = %self.address, error = %e, "update sweep failed");
                        }
                    }
                    None => break,
                }
            }
        }
        self.shutdown().await;
    }

    /// Stop-path teardown. RPC failures are swallowed so state persistence
    /// and lock release always happen.
    async fn shutdown(mut self) {
        self.client.unsubscribe(&self.address);
        if let Err(e) = save_state(&self.state_path, &self.state) {
            error!(board = %self.address, error = %e, "failed to persist state on stop");
        }
        self.lock.release();
        if let Err(e) = self.client.stop_board(&self.address).await {
            warn!(board = %self.address, error = %e, "failed to stop board stream");
        }
        if let Err(e) = self.client.destroy().await {
            warn!(board = %self.address, error = %e, "failed to destroy rpc connection");
        }
        info!(board = %self.address, "board worker stopped");
    }

    /// One sweep: refresh the board view, migrate on address drift, then
    /// apply the four rules in order.
    async fn run_update(&mut self) -> Result<(), WorkerError> {
        let board = self.client.get_board(&self.address).await?;
        if board.address != self.address {
            let new_address = board.address.clone();
            self.migrate(&new_address).await?;
        }

        if !board.posts.has_content() {
            return Ok(());
        }

        let threads =
            paginator::collect_threads(self.client.as_ref(), &self.address, &board.posts).await?;
        let now = self.clock.epoch_secs();

        self.archive_over_capacity(&threads, now).await;
        self.archive_bumped(&threads, now).await;
        self.purge_expired(now).await;
        self.purge_deleted(&threads).await;
        Ok(())
    }

    /// Capacity: archive the non-pinned tail beyond `max_threads`. Threads
    /// already archived in the RPC view or in state still occupy overflow
    /// slots but are not re-archived.
    async fn archive_over_capacity(&mut self, threads: &[Thread], now: u64) {
        let capacity = usize::try_from(self.settings.max_threads).unwrap_or(usize::MAX);
        let overflow: Vec<&Thread> = threads
            .iter()
            .filter(|t| !t.pinned)
            .skip(capacity)
            .collect();

        for thread in overflow {
            if self.cancel.is_cancelled() {
                return;
            }
            if thread.archived || self.state.archived_threads.contains_key(&thread.cid) {
                continue;
            }
            let reason = self.settings.reasons.archive_capacity.clone();
            if self.publish_archive(&thread.cid, reason).await {
                self.record_archive(&thread.cid, now);
            }
        }
    }

    /// Archive every non-pinned thread at or past the bump limit.
    async fn archive_bumped(&mut self, threads: &[Thread], now: u64) {
        for thread in threads.iter().filter(|t| !t.pinned) {
            if self.cancel.is_cancelled() {
                return;
            }
            if thread.reply_count < self.settings.bump_limit {
                continue;
            }
            if thread.archived || self.state.archived_threads.contains_key(&thread.cid) {
                continue;
            }
            let reason = self.settings.reasons.archive_bump_limit.clone();
            if self.publish_archive(&thread.cid, reason).await {
                self.record_archive(&thread.cid, now);
            }
        }
    }

    /// Purge archives older than the retention window. The bound
    /// is strict, so an entry exactly at the boundary survives one more
    /// tick.
    async fn purge_expired(&mut self, now: u64) {
        let expired: Vec<String> = self
            .state
            .archived_threads
            .iter()
            .filter(|(_, info)| {
                now > info
                    .archived_timestamp
                    .saturating_add(self.settings.archive_purge_seconds)
            })
            .map(|(cid, _)| cid.clone())
            .collect();

        for cid in expired {
            if self.cancel.is_cancelled() {
                return;
            }
            let reason = self.settings.reasons.purge_archived.clone();
            if self.publish_purge(&cid, reason).await {
                self.state.archived_threads.shift_remove(&cid);
                self.purged.insert(cid);
                self.persist();
            }
        }
    }

    /// Purge author-deleted threads (pinned included) and every
    /// deleted descendant found by the reply walk.
    async fn purge_deleted(&mut self, threads: &[Thread]) {
        for thread in threads {
            if self.cancel.is_cancelled() {
                return;
            }

            if thread.deleted && !self.purged.contains(&thread.cid) {
                let reason = self.settings.reasons.purge_deleted.clone();
                if self.publish_purge(&thread.cid, reason).await {
                    self.purged.insert(thread.cid.clone());
                    if self.state.archived_threads.shift_remove(&thread.cid).is_some() {
                        self.persist();
                    }
                }
            }

            let deleted_replies = match paginator::collect_deleted_replies(
                self.client.as_ref(),
                &self.address,
                thread,
            )
            .await
            {
                Ok(cids) => cids,
                Err(e) => {
                    error!(
                        board = %self.address,
                        thread = %thread.cid,
                        error = %e,
                        "failed to scan replies for deletions"
                    );
                    continue;
                }
            };

            for cid in deleted_replies {
                if self.cancel.is_cancelled() {
                    return;
                }
                if self.purged.contains(&cid) {
                    continue;
                }
                let reason = self.settings.reasons.purge_deleted.clone();
                if self.publish_purge(&cid, reason).await {
                    self.purged.insert(cid);
                }
            }
        }
    }

    /// Adopt a new board address reported by the RPC.
    ///
    /// Re-keys the signer entry, writes state where the directory still
    /// lives, asks the supervisor to rename the directory and re-key its
    /// worker map, then locks the state document at its new home. A failed
    /// new-lock acquisition rolls the whole migration back.
    async fn migrate(&mut self, new_address: &str) -> Result<(), WorkerError> {
        let old_address = self.address.clone();
        info!(board = %old_address, new_address, "board address changed, migrating");

        if let Some(entry) = self.state.signers.remove(&old_address) {
            self.state.signers.insert(new_address.to_string(), entry);
        }
        self.lock.release();

        if let Err(e) = save_state(&self.state_path, &self.state) {
            self.restore_signer(&old_address, new_address);
            self.reacquire_old_lock();
            return Err(e.into());
        }

        if let Err(e) = (self.on_address_change)(&old_address, new_address) {
            self.restore_signer(&old_address, new_address);
            self.reacquire_old_lock();
            let _ = save_state(&self.state_path, &self.state);
            return Err(WorkerError::Migration {
                new_address: new_address.to_string(),
                message: e.to_string(),
            });
        }

        let new_board_dir = self.board_dir.with_file_name(new_address);
        let new_state_path = new_board_dir.join(STATE_FILE);
        match StateLock::acquire(&new_state_path) {
            Ok(lock) => self.lock = lock,
            Err(e) => {
                // Rollback: invert the rename, restore the signer entry,
                // retake the old lock, re-save the old state.
                if let Err(invert_err) = (self.on_address_change)(new_address, &old_address) {
                    error!(
                        board = %old_address,
                        error = %invert_err,
                        "failed to invert directory rename during migration rollback"
                    );
                }
                self.restore_signer(&old_address, new_address);
                self.reacquire_old_lock();
                let _ = save_state(&self.state_path, &self.state);
                return Err(WorkerError::Migration {
                    new_address: new_address.to_string(),
                    message: e.to_string(),
                });
            }
        }

        self.client.unsubscribe(&old_address);
        self.client.subscribe(new_address, self.update_tx.clone());
        self.address = new_address.to_string();
        self.board_dir = new_board_dir;
        self.state_path = new_state_path;
        info!(board = %self.address, "address migration complete");
        Ok(())
    }

    fn restore_signer(&mut self, old_address: &str, new_address: &str) {
        if let Some(entry) = self.state.signers.remove(new_address) {
            self.state.signers.insert(old_address.to_string(), entry);
        }
    }

    fn reacquire_old_lock(&mut self) {
        match StateLock::acquire(&self.state_path) {
            Ok(lock) => self.lock = lock,
            Err(e) => error!(
                board = %self.address,
                error = %e,
                "failed to reacquire lock during migration rollback"
            ),
        }
    }

    async fn publish_archive(&self, cid: &str, reason: String) -> bool {
        match ModerationRecord::archive(cid, &self.address, reason, &self.signer) {
            Ok(record) => self.publish(cid, &record).await,
            Err(e) => {
                error!(board = %self.address, cid, error = %e, "failed to sign archive record");
                false
            }
        }
    }

    async fn publish_purge(&self, cid: &str, reason: String) -> bool {
        match ModerationRecord::purge(cid, &self.address, reason, &self.signer) {
            Ok(record) => self.publish(cid, &record).await,
            Err(e) => {
                error!(board = %self.address, cid, error = %e, "failed to sign purge record");
                false
            }
        }
    }

    /// Best-effort publish. A failure leaves the item unrecorded so the
    /// next update retries it.
    async fn publish(&self, cid: &str, record: &ModerationRecord) -> bool {
        match self.client.publish_moderation(record).await {
            Ok(()) => {
                info!(
                    board = %self.address,
                    cid,
                    reason = %record.comment_moderation.reason,
                    archived = record.comment_moderation.is_archive(),
                    "published moderation"
                );
                true
            }
            Err(e) => {
                error!(board = %self.address, cid, error = %e, "failed to publish moderation");
                false
            }
        }
    }

    fn record_archive(&mut self, cid: &str, now: u64) {
        self.state.archived_threads.insert(
            cid.to_string(),
            ArchivedThread {
                archived_timestamp: now,
            },
        );
        self.persist();
    }

    fn persist(&mut self) {
        if let Err(e) = save_state(&self.state_path, &self.state) {
            error!(board = %self.address, error = %e, "failed to persist state");
        }
    }
}

#[cfg(test)]
#[path = "worker_tests/mod.rs"]
mod tests;
