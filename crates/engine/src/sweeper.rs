// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sweeper loop (spec §4.1 "Sweeper").
//!
//! Every tick (default 30 s), force-removes pool records whose PID is
//! observably dead but whose waiter hasn't fired (seen when the child is a
//! session leader), and garbage-collects spawn-registry entries in the
//! same way. Both detectors already live on their owning types; this is
//! just the periodic driver, cancellable via `CancellationToken`.

use af_adapters::{Launcher, WorkSource};
use af_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::pool::AgentPool;
use crate::spawn_registry::SpawnRegistry;

pub async fn run_sweeper<W, L, C>(
    pool: Arc<AgentPool<W, L, C>>,
    spawn_registry: Arc<SpawnRegistry>,
    sweep_interval: Duration,
    shutdown: CancellationToken,
) where
    W: WorkSource + 'static,
    L: Launcher + 'static,
    C: Clock + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(sweep_interval) => {}
        }

        let pool_swept = pool.sweep_dead().await;
        let registry_swept = spawn_registry.sweep_dead();
        if pool_swept > 0 || registry_swept > 0 {
            info!(pool_swept, registry_swept, "sweeper reclaimed dead entries");
        }
    }
}

#[cfg(test)]
#[path = "sweeper_tests.rs"]
mod tests;
