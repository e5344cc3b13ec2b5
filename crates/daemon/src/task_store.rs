// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local JSON-file-backed `WorkSource`.
//!
//! The task store is an external collaborator per the core's design; this
//! is the minimal concrete backend the `afd` binary needs to run end to
//! end without one. Tasks live in a single JSON document at
//! `state_dir/tasks.json`, written with the same temp-file-plus-rename
//! discipline `af-storage` uses, kept crate-local since only this one
//! process ever touches it.

use af_adapters::{WorkSource, WorkSourceError};
use af_core::{TaskLogEntry, TaskMeta, TaskRef, TaskStatus};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Default)]
struct Document {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    tasks: Vec<TaskMeta>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

#[derive(Debug, thiserror::Error)]
pub enum TaskStoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

/// A local, single-process `WorkSource` backed by a JSON document.
pub struct JsonTaskStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, TaskMeta>>,
}

impl JsonTaskStore {
    pub fn open(state_dir: &Path) -> Result<Self, TaskStoreError> {
        let path = state_dir.join("tasks.json");
        let tasks = load(&path)?;
        let cache = tasks.into_iter().map(|t| (t.id.clone(), t)).collect();
        Ok(Self { path, cache: Mutex::new(cache) })
    }

    /// Seed or replace a task, bypassing the `WorkSource` lifecycle calls.
    /// Exposed for tests and for a future `tasks add` CLI surface.
    pub fn put(&self, meta: TaskMeta) -> Result<(), TaskStoreError> {
        self.cache.lock().insert(meta.id.clone(), meta);
        self.persist()
    }

    fn persist(&self) -> Result<(), TaskStoreError> {
        let tasks: Vec<TaskMeta> = self.cache.lock().values().cloned().collect();
        let doc = Document { schema_version: SCHEMA_VERSION, tasks };
        let bytes = serde_json::to_vec_pretty(&doc)?;
        write_atomic(&self.path, &bytes)
    }

    fn set_status(&self, id: &str, status: TaskStatus) -> Result<(), WorkSourceError> {
        {
            let mut cache = self.cache.lock();
            let meta =
                cache.get_mut(id).ok_or_else(|| WorkSourceError::NotFound(id.to_string()))?;
            meta.status = status;
        }
        self.persist().map_err(|e| WorkSourceError::Backend(e.to_string()))
    }

    fn refs_with_status(&self, status: TaskStatus) -> Vec<TaskRef> {
        let mut tasks: Vec<TaskRef> = self
            .cache
            .lock()
            .values()
            .filter(|t| t.status == status)
            .map(|t| TaskRef { id: t.id.clone(), priority: t.priority, title: t.title.clone() })
            .collect();
        tasks.sort_by(|a, b| b.priority.cmp(&a.priority));
        tasks
    }
}

fn load(path: &Path) -> Result<Vec<TaskMeta>, TaskStoreError> {
    match fs::read(path) {
        Ok(bytes) => Ok(serde_json::from_slice::<Document>(&bytes)?.tasks),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), TaskStoreError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;
    let tmp_path = dir.join(format!(
        ".{}.tmp.{}",
        path.file_name().and_then(|n| n.to_str()).unwrap_or("tasks"),
        std::process::id()
    ));
    fs::write(&tmp_path, bytes)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

fn now_timestamp() -> String {
    let ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    ms.to_string()
}

#[async_trait]
impl WorkSource for JsonTaskStore {
    async fn ready(&self, _project: &str) -> Result<Vec<TaskRef>, WorkSourceError> {
        Ok(self.refs_with_status(TaskStatus::Open))
    }

    async fn meta(&self, id: &str) -> Result<TaskMeta, WorkSourceError> {
        self.cache
            .lock()
            .get(id)
            .cloned()
            .ok_or_else(|| WorkSourceError::NotFound(id.to_string()))
    }

    async fn claim(&self, id: &str) -> Result<(), WorkSourceError> {
        self.set_status(id, TaskStatus::InProgress)
    }

    async fn yield_(&self, id: &str) -> Result<(), WorkSourceError> {
        self.set_status(id, TaskStatus::Open)
    }

    async fn complete(&self, id: &str) -> Result<(), WorkSourceError> {
        self.set_status(id, TaskStatus::Done)
    }

    async fn review(&self, id: &str) -> Result<(), WorkSourceError> {
        self.set_status(id, TaskStatus::Reviewing)
    }

    async fn log(&self, id: &str, message: &str) -> Result<(), WorkSourceError> {
        {
            let mut cache = self.cache.lock();
            let meta =
                cache.get_mut(id).ok_or_else(|| WorkSourceError::NotFound(id.to_string()))?;
            meta.logs.push(TaskLogEntry { message: message.to_string(), created_at: now_timestamp() });
        }
        self.persist().map_err(|e| WorkSourceError::Backend(e.to_string()))
    }

    async fn reviewing(&self, _project: &str) -> Result<Vec<TaskRef>, WorkSourceError> {
        Ok(self.refs_with_status(TaskStatus::Reviewing))
    }

    async fn in_progress(&self, _project: &str) -> Result<Vec<TaskRef>, WorkSourceError> {
        Ok(self.refs_with_status(TaskStatus::InProgress))
    }
}

#[cfg(test)]
#[path = "task_store_tests.rs"]
mod tests;
