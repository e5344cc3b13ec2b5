// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `WorkSource`: the boundary over the external task store (spec §2, §3).
//!
//! The core never talks to the task store directly — every call goes
//! through this trait, wrapped at the call site with a bounded timeout
//! (SPEC_FULL §3). `in_progress` is added explicitly (not folded into
//! `ready`) so the boundary stays a total, named interface rather than an
//! overloaded query, per Design Note §9.

use af_core::{ErrorCode, TaskMeta, TaskRef};
use async_trait::async_trait;
use std::time::Duration;

/// Default per-call timeout for task-store operations (spec §5).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum WorkSourceError {
    #[error("task store operation timed out")]
    Timeout,
    #[error("task not found: {0}")]
    NotFound(String),
    #[error("task store error: {0}")]
    Backend(String),
}

impl WorkSourceError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Timeout => ErrorCode::Timeout,
            Self::NotFound(_) => ErrorCode::NotFound,
            Self::Backend(_) => ErrorCode::StoreError,
        }
    }
}

/// Boundary over the external task database (spec §2 "Task store client").
#[async_trait]
pub trait WorkSource: Send + Sync {
    async fn ready(&self, project: &str) -> Result<Vec<TaskRef>, WorkSourceError>;
    async fn meta(&self, id: &str) -> Result<TaskMeta, WorkSourceError>;
    async fn claim(&self, id: &str) -> Result<(), WorkSourceError>;
    async fn yield_(&self, id: &str) -> Result<(), WorkSourceError>;
    async fn complete(&self, id: &str) -> Result<(), WorkSourceError>;
    async fn review(&self, id: &str) -> Result<(), WorkSourceError>;
    async fn log(&self, id: &str, message: &str) -> Result<(), WorkSourceError>;
    async fn reviewing(&self, project: &str) -> Result<Vec<TaskRef>, WorkSourceError>;
    /// Tasks this project's pool should be working (`status = in_progress`),
    /// as queried by the reclaimer at startup (spec §4.4; SPEC_FULL §3).
    async fn in_progress(&self, project: &str) -> Result<Vec<TaskRef>, WorkSourceError>;
}

/// Run a `WorkSource` call with the configured timeout, mapping an elapsed
/// deadline onto `WorkSourceError::Timeout` (spec §5).
pub async fn with_timeout<T, F>(timeout: Duration, fut: F) -> Result<T, WorkSourceError>
where
    F: std::future::Future<Output = Result<T, WorkSourceError>>,
{
    match tokio::time::timeout(timeout, fut).await {
        Ok(result) => result,
        Err(_) => Err(WorkSourceError::Timeout),
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod fake {
    use super::*;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    /// In-memory `WorkSource` for engine unit tests (SPEC_FULL §3).
    #[derive(Default)]
    pub struct FakeWorkSource {
        inner: Mutex<Inner>,
    }

    #[derive(Default)]
    struct Inner {
        ready: Vec<TaskRef>,
        in_progress: Vec<TaskRef>,
        reviewing: Vec<TaskRef>,
        meta: HashMap<String, TaskMeta>,
        claimed: Vec<String>,
        completed: Vec<String>,
        reviewed: Vec<String>,
        yielded: Vec<String>,
        logs: Vec<(String, String)>,
    }

    impl FakeWorkSource {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_ready(&self, tasks: Vec<TaskRef>) {
            self.inner.lock().ready = tasks;
        }

        pub fn set_in_progress(&self, tasks: Vec<TaskRef>) {
            self.inner.lock().in_progress = tasks;
        }

        pub fn set_reviewing(&self, tasks: Vec<TaskRef>) {
            self.inner.lock().reviewing = tasks;
        }

        pub fn insert_meta(&self, meta: TaskMeta) {
            self.inner.lock().meta.insert(meta.id.clone(), meta);
        }

        pub fn claimed(&self) -> Vec<String> {
            self.inner.lock().claimed.clone()
        }

        pub fn completed(&self) -> Vec<String> {
            self.inner.lock().completed.clone()
        }
    }

    #[async_trait]
    impl WorkSource for FakeWorkSource {
        async fn ready(&self, _project: &str) -> Result<Vec<TaskRef>, WorkSourceError> {
            Ok(self.inner.lock().ready.clone())
        }

        async fn meta(&self, id: &str) -> Result<TaskMeta, WorkSourceError> {
            self.inner
                .lock()
                .meta
                .get(id)
                .cloned()
                .ok_or_else(|| WorkSourceError::NotFound(id.to_string()))
        }

        async fn claim(&self, id: &str) -> Result<(), WorkSourceError> {
            self.inner.lock().claimed.push(id.to_string());
            Ok(())
        }

        async fn yield_(&self, id: &str) -> Result<(), WorkSourceError> {
            self.inner.lock().yielded.push(id.to_string());
            Ok(())
        }

        async fn complete(&self, id: &str) -> Result<(), WorkSourceError> {
            self.inner.lock().completed.push(id.to_string());
            Ok(())
        }

        async fn review(&self, id: &str) -> Result<(), WorkSourceError> {
            self.inner.lock().reviewed.push(id.to_string());
            Ok(())
        }

        async fn log(&self, id: &str, message: &str) -> Result<(), WorkSourceError> {
            self.inner.lock().logs.push((id.to_string(), message.to_string()));
            Ok(())
        }

        async fn reviewing(&self, _project: &str) -> Result<Vec<TaskRef>, WorkSourceError> {
            Ok(self.inner.lock().reviewing.clone())
        }

        async fn in_progress(&self, _project: &str) -> Result<Vec<TaskRef>, WorkSourceError> {
            Ok(self.inner.lock().in_progress.clone())
        }
    }
}

#[cfg(test)]
#[path = "worksource_tests.rs"]
mod tests;
