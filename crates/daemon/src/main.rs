// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use af_daemon::config::SpawnPolicy;
use af_daemon::{env, startup, Config};
use af_engine::{run_poller, run_reconciler, run_sweeper, Reconciler};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match Config::load(env::config_path().as_deref()) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "config validation failed");
            std::process::exit(e.exit_code());
        }
    };

    let (state, listener) = match startup(config).await {
        Ok(result) => result,
        Err(e) => {
            error!(error = %e, "daemon startup failed");
            std::process::exit(1);
        }
    };

    let shutdown = state.shutdown.clone();
    let pool = Arc::clone(&state.pool);
    tokio::spawn(Arc::clone(&pool).run_reap_loop());
    tokio::spawn(run_sweeper(
        Arc::clone(&pool),
        Arc::clone(&state.spawn_registry),
        Duration::from_secs(30),
        shutdown.clone(),
    ));

    if state.config.spawn_policy == SpawnPolicy::Auto {
        let project = state.config.project.clone().unwrap_or_default();
        tokio::spawn(run_poller(
            Arc::clone(&pool),
            Arc::clone(&state.work_source),
            project.clone(),
            state.config.poll_interval,
            shutdown.clone(),
        ));

        if !state.config.solo {
            let git =
                Arc::new(Reconciler::new(state.config.repo_path.clone(), state.config.main_ref.clone()));
            tokio::spawn(run_reconciler(
                Arc::clone(&state.work_source),
                git,
                project,
                state.config.reconcile_interval,
                state.config.branch_prefix.clone(),
                shutdown.clone(),
            ));
        }
    }

    info!(socket = %state.config.socket_path.display(), "daemon ready");
    let socket_path = state.config.socket_path.clone();
    let state = Arc::new(state);
    af_daemon::listener::run_listener(listener, Arc::clone(&state), shutdown.clone()).await;

    shutdown.cancel();
    let _ = std::fs::remove_file(&socket_path);
    info!("daemon shut down");
}
