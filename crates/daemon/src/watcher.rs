// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Debounced configuration watcher.
//!
//! Filesystem events for the global file and for board files directly
//! under `boards/` arm a 200 ms trailing timer; when it fires, the
//! supervisor reconciles once. Events for anything else in the tree are
//! ignored, notably the per-board state directories living next to the
//! board files.

use std::path::Path;
use std::time::Duration;

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use bm_config::{boards_dir, global_path};
use bm_core::Clock;

use crate::supervisor::{Supervisor, SupervisorError};

pub(crate) const DEBOUNCE: Duration = Duration::from_millis(200);

pub(crate) fn spawn<C: Clock + 'static>(supervisor: Supervisor<C>) -> Result<(), SupervisorError> {
    let config_dir = supervisor.config_dir().to_path_buf();
    std::fs::create_dir_all(&config_dir).map_err(|e| SupervisorError::Io {
        path: config_dir.clone(),
        source: e,
    })?;

    let (raw_tx, mut raw_rx) = mpsc::unbounded_channel();
    let mut watcher = RecommendedWatcher::new(
        move |result| {
            let _ = raw_tx.send(result);
        },
        notify::Config::default(),
    )
    .map_err(|e| SupervisorError::Watch {
        path: config_dir.clone(),
        source: e,
    })?;
    watcher
        .watch(&config_dir, RecursiveMode::Recursive)
        .map_err(|e| SupervisorError::Watch {
            path: config_dir.clone(),
            source: e,
        })?;

    let cancel = supervisor.watcher_cancel();
    let global = global_path(&config_dir);
    let boards = boards_dir(&config_dir);

    tokio::spawn(async move {
        // Dropping the watcher stops filesystem monitoring.
        let _watcher = watcher;
        let mut deadline: Option<tokio::time::Instant> = None;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,

                // Trailing debounce: reconcile once the burst settles.
                () = async {
                    match deadline {
                        Some(at) => tokio::time::sleep_until(at).await,
                        None => std::future::pending().await,
                    }
                } => {
                    deadline = None;
                    supervisor.reconcile().await;
                }

                event = raw_rx.recv() => match event {
                    Some(Ok(event)) => {
                        if is_config_event(&event, &global, &boards) {
                            debug!(paths = ?event.paths, "config change detected");
                            deadline = Some(tokio::time::Instant::now() + DEBOUNCE);
                        }
                    }
                    Some(Err(e)) => warn!(error = %e, "config watcher error"),
                    None => break,
                }
            }
        }
    });

    Ok(())
}

fn is_config_event(event: &Event, global: &Path, boards: &Path) -> bool {
    if !matches!(
        event.kind,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        path == global
            || (path.parent() == Some(boards) && path.extension().is_some_and(|ext| ext == "json"))
    })
}

#[cfg(test)]
#[path = "watcher_tests.rs"]
mod tests;
