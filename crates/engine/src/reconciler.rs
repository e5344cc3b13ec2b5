// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconciler loop (spec §4.5).
//!
//! Only runs when `spawn_policy=auto` and not `solo`. Every tick, fetches
//! the configured upstream main ref, then for each `reviewing` task checks
//! whether its agent branch (`branch_prefix/<task_id>`) has been merged
//! into main or no longer exists; if either holds, calls `complete`.
//! Errors are logged and never fatal (spec §4.5, §7).

use af_adapters::WorkSource;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("git operation failed: {0}")]
    Backend(String),
}

/// Boundary over the upstream git repository (spec §4.5 steps 1-2).
#[async_trait]
pub trait GitState: Send + Sync {
    async fn fetch_origin_main(&self) -> Result<(), GitError>;
    /// True if `branch` is either an ancestor of main or no longer exists.
    async fn branch_merged_or_gone(&self, branch: &str) -> Result<bool, GitError>;
}

/// `git2`-backed `GitState` over a local working copy (spec §4.5).
pub struct Reconciler {
    repo_path: PathBuf,
    main_ref: String,
}

impl Reconciler {
    pub fn new(repo_path: impl Into<PathBuf>, main_ref: impl Into<String>) -> Self {
        Self { repo_path: repo_path.into(), main_ref: main_ref.into() }
    }
}

#[async_trait]
impl GitState for Reconciler {
    async fn fetch_origin_main(&self) -> Result<(), GitError> {
        let repo_path = self.repo_path.clone();
        let main_ref = self.main_ref.clone();
        tokio::task::spawn_blocking(move || fetch_origin(&repo_path, &main_ref))
            .await
            .map_err(|e| GitError::Backend(e.to_string()))?
    }

    async fn branch_merged_or_gone(&self, branch: &str) -> Result<bool, GitError> {
        let repo_path = self.repo_path.clone();
        let main_ref = self.main_ref.clone();
        let branch = branch.to_string();
        tokio::task::spawn_blocking(move || is_merged_or_gone(&repo_path, &main_ref, &branch))
            .await
            .map_err(|e| GitError::Backend(e.to_string()))?
    }
}

fn fetch_origin(repo_path: &Path, main_ref: &str) -> Result<(), GitError> {
    let repo = git2::Repository::open(repo_path).map_err(|e| GitError::Backend(e.to_string()))?;
    let mut remote =
        repo.find_remote("origin").map_err(|e| GitError::Backend(e.to_string()))?;
    let short = main_ref.rsplit('/').next().unwrap_or(main_ref);
    remote
        .fetch(&[short], None, None)
        .map_err(|e| GitError::Backend(e.to_string()))?;
    Ok(())
}

fn is_merged_or_gone(repo_path: &Path, main_ref: &str, branch: &str) -> Result<bool, GitError> {
    let repo = git2::Repository::open(repo_path).map_err(|e| GitError::Backend(e.to_string()))?;
    let branch_oid = match repo.revparse_single(branch) {
        Ok(obj) => obj.id(),
        Err(_) => return Ok(true),
    };
    let main_oid = repo
        .revparse_single(main_ref)
        .map_err(|e| GitError::Backend(e.to_string()))?
        .id();
    let is_ancestor = repo
        .graph_descendant_of(main_oid, branch_oid)
        .map_err(|e| GitError::Backend(e.to_string()))?;
    Ok(is_ancestor || branch_oid == main_oid)
}

/// Run the reconciler until `shutdown` is cancelled (spec §4.5).
pub async fn run_reconciler<W, G>(
    work_source: Arc<W>,
    git: Arc<G>,
    project: String,
    reconcile_interval: Duration,
    branch_prefix: String,
    shutdown: CancellationToken,
) where
    W: WorkSource + 'static,
    G: GitState + 'static,
{
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => return,
            _ = tokio::time::sleep(reconcile_interval) => {}
        }

        if let Err(e) = git.fetch_origin_main().await {
            warn!(error = %e, "reconciler: fetch failed");
            continue;
        }

        let reviewing = match work_source.reviewing(&project).await {
            Ok(tasks) => tasks,
            Err(e) => {
                warn!(error = %e, "reconciler: reviewing() failed");
                continue;
            }
        };

        for task in reviewing {
            let branch = format!("{branch_prefix}/{}", task.id);
            match git.branch_merged_or_gone(&branch).await {
                Ok(true) => {
                    if let Err(e) = work_source.complete(&task.id).await {
                        warn!(task_id = %task.id, error = %e, "reconciler: complete() failed");
                    }
                }
                Ok(false) => {}
                Err(e) => warn!(task_id = %task.id, branch, error = %e, "reconciler: merge check failed"),
            }
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory `GitState` for reconciler unit tests (SPEC_FULL §5).
    #[derive(Default)]
    pub struct FakeGitState {
        merged: Mutex<HashMap<String, bool>>,
        fetch_count: Mutex<u32>,
    }

    impl FakeGitState {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_merged(&self, branch: &str, merged: bool) {
            self.merged.lock().insert(branch.to_string(), merged);
        }

        pub fn fetch_count(&self) -> u32 {
            *self.fetch_count.lock()
        }
    }

    #[async_trait]
    impl GitState for FakeGitState {
        async fn fetch_origin_main(&self) -> Result<(), GitError> {
            *self.fetch_count.lock() += 1;
            Ok(())
        }

        async fn branch_merged_or_gone(&self, branch: &str) -> Result<bool, GitError> {
            Ok(*self.merged.lock().get(branch).unwrap_or(&true))
        }
    }
}

#[cfg(test)]
#[path = "reconciler_tests.rs"]
mod tests;
