// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! bm-daemon: the multi-board supervisor.
//!
//! Starts one worker per declared board, watches the configuration tree,
//! and reconciles the running worker set against declared state on every
//! debounced change.

mod signal;
mod supervisor;
mod watcher;

pub use signal::shutdown_signal;
pub use supervisor::{Supervisor, SupervisorError};
