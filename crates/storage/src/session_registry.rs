// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable session registry (spec §3 "Session registry record", §6.3, §7).
//!
//! A single JSON document `{schema_version, records}` at
//! `state_dir/sessions.json`, written via `write_atomic` and guarded by the
//! advisory lock in `crate::atomic`. Canonical key is `(server_ref,
//! session_id)` (spec §3). Unknown fields on each record round-trip via
//! `SessionRecord::extra` (spec §6.3 "forward compatibility").

use af_core::SessionRecord;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::atomic::{acquire_lock, read_if_exists, write_atomic};
use crate::error::StoreError;

const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize, Default)]
struct Document {
    #[serde(default = "default_schema_version")]
    schema_version: u32,
    #[serde(default)]
    records: Vec<SessionRecord>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Durable session registry, keyed by `(server_ref, session_id)`.
///
/// Holds an in-memory cache behind a mutex so readers don't need to hit
/// disk on every RPC; every mutation re-reads, mutates, and writes back
/// under the advisory lock so concurrent daemon processes (shouldn't
/// happen, but defensively) never silently clobber each other.
pub struct SessionRegistryStore {
    path: PathBuf,
    cache: Mutex<HashMap<(String, String), SessionRecord>>,
}

impl SessionRegistryStore {
    /// Open (or create on first write) the registry at `state_dir/sessions.json`.
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let path = state_dir.join("sessions.json");
        let records = load(&path)?;
        let cache = records.into_iter().map(|r| (r.key(), r)).collect();
        Ok(Self { path, cache: Mutex::new(cache) })
    }

    /// Insert or replace a record. Used both for first-binding and for
    /// status-field updates from subsequent events.
    pub fn upsert(&self, record: SessionRecord) -> Result<(), StoreError> {
        let _lock = acquire_lock(&self.path)?;
        let mut records = load(&self.path)?;
        let key = record.key();
        if let Some(existing) = records.iter_mut().find(|r| r.key() == key) {
            *existing = record.clone();
        } else {
            records.push(record.clone());
        }
        persist(&self.path, &records)?;
        self.cache.lock().insert(key, record);
        Ok(())
    }

    pub fn get(&self, server_ref: &str, session_id: &str) -> Option<SessionRecord> {
        self.cache.lock().get(&(server_ref.to_string(), session_id.to_string())).cloned()
    }

    pub fn list(&self) -> Vec<SessionRecord> {
        self.cache.lock().values().cloned().collect()
    }
}

fn load(path: &Path) -> Result<Vec<SessionRecord>, StoreError> {
    match read_if_exists(path)? {
        Some(bytes) => {
            let doc: Document = serde_json::from_slice(&bytes)?;
            Ok(doc.records)
        }
        None => Ok(Vec::new()),
    }
}

fn persist(path: &Path, records: &[SessionRecord]) -> Result<(), StoreError> {
    let doc = Document { schema_version: SCHEMA_VERSION, records: records.to_vec() };
    let bytes = serde_json::to_vec_pretty(&doc)?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
#[path = "session_registry_tests.rs"]
mod tests;
