// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Poller loop (spec §4.3).
//!
//! Single tokio task, woken on a fixed interval. Skips the tick entirely
//! when the pool isn't in `active` mode so a `draining`/`paused` daemon
//! never calls into the task store for new work. Cancellable via
//! `CancellationToken`; an in-flight tick always finishes (spec §5).

use af_adapters::{Launcher, WorkSource};
use af_core::Clock;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::pool::AgentPool;

/// Run the poller until `shutdown` is cancelled (spec §4.3).
pub async fn run_poller<W, L, C>(
    pool: Arc<AgentPool<W, L, C>>,
    work_source: Arc<W>,
    project: String,
    poll_interval: Duration,
    shutdown: CancellationToken,
) where
    W: WorkSource + 'static,
    L: Launcher + 'static,
    C: Clock + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(poll_interval) => {}
        }

        if !pool.mode().schedules_new_work() {
            continue;
        }

        match work_source.ready(&project).await {
            Ok(tasks) => {
                let assigned = pool.try_assign(&tasks).await;
                if assigned > 0 {
                    tracing::debug!(assigned, "poller assigned tasks");
                }
            }
            Err(e) => warn!(error = %e, "poller: ready() failed"),
        }
    }
}

#[cfg(test)]
#[path = "poller_tests.rs"]
mod tests;
