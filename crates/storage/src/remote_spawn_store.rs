// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable remote-spawn store (spec §3 "Remote-spawn record", §6.3, §8).
//!
//! Same discipline as `session_registry`, keyed by `spawn_id`, with a
//! secondary in-memory index over the idempotency key `(provider, project,
//! request_id)` rebuilt from disk on load (spec I6, §8 scenario 6).
//! Retention only prunes terminal (`Failed`/`Terminated`) records, by TTL
//! and by count (spec §6.3).

use af_core::RemoteSpawnRecord;
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
    records: Vec<RemoteSpawnRecord>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Outcome of an idempotent upsert attempt (spec §8 scenario 6).
pub enum UpsertOutcome {
    /// No existing record for this key; the new one was created.
    Created(RemoteSpawnRecord),
    /// An existing record with the same key and payload fingerprint; no
    /// write performed, existing record returned unchanged.
    Existing(RemoteSpawnRecord),
    /// An existing record with the same key but a different payload
    /// fingerprint. No write performed.
    Conflict,
}

pub struct RemoteSpawnStore {
    path: PathBuf,
    cache: Mutex<HashMap<String, RemoteSpawnRecord>>,
}

impl RemoteSpawnStore {
    pub fn open(state_dir: &Path) -> Result<Self, StoreError> {
        let path = state_dir.join("remote_spawns.json");
        let records = load(&path)?;
        let cache = records.into_iter().map(|r| (r.spawn_id.clone(), r)).collect();
        Ok(Self { path, cache: Mutex::new(cache) })
    }

    /// Idempotent upsert keyed by `(provider, project, request_id)`.
    pub fn upsert(&self, record: RemoteSpawnRecord) -> Result<UpsertOutcome, StoreError> {
        let _lock = acquire_lock(&self.path)?;
        let mut records = load(&self.path)?;
        let key = record.idempotency_key();
        if let Some(existing) = records.iter().find(|r| r.idempotency_key() == key) {
            return if existing.request_fingerprint == record.request_fingerprint {
                Ok(UpsertOutcome::Existing(existing.clone()))
            } else {
                Ok(UpsertOutcome::Conflict)
            };
        }
        records.push(record.clone());
        persist(&self.path, &records)?;
        self.cache.lock().insert(record.spawn_id.clone(), record.clone());
        Ok(UpsertOutcome::Created(record))
    }

    /// Update the mutable fields of an existing record (state, session_id,
    /// last_error) in place.
    pub fn update(&self, record: RemoteSpawnRecord) -> Result<(), StoreError> {
        let _lock = acquire_lock(&self.path)?;
        let mut records = load(&self.path)?;
        if let Some(existing) = records.iter_mut().find(|r| r.spawn_id == record.spawn_id) {
            *existing = record.clone();
        } else {
            records.push(record.clone());
        }
        persist(&self.path, &records)?;
        self.cache.lock().insert(record.spawn_id.clone(), record);
        Ok(())
    }

    pub fn get(&self, spawn_id: &str) -> Option<RemoteSpawnRecord> {
        self.cache.lock().get(spawn_id).cloned()
    }

    pub fn list(&self) -> Vec<RemoteSpawnRecord> {
        self.cache.lock().values().cloned().collect()
    }

    /// Prune terminal records past `ttl_ms` old, or beyond `max_count` total
    /// terminal records (oldest first). Non-terminal records are never
    /// touched (spec §8 invariant).
    pub fn prune(&self, now_ms: u64, ttl_ms: u64, max_count: usize) -> Result<usize, StoreError> {
        let _lock = acquire_lock(&self.path)?;
        let mut records = load(&self.path)?;

        let mut terminal_idx: Vec<usize> = records
            .iter()
            .enumerate()
            .filter(|(_, r)| r.state.is_terminal())
            .map(|(i, _)| i)
            .collect();
        terminal_idx.sort_by_key(|&i| records[i].updated_at_ms);

        let mut to_remove = std::collections::HashSet::new();
        for &i in &terminal_idx {
            if now_ms.saturating_sub(records[i].updated_at_ms) > ttl_ms {
                to_remove.insert(i);
            }
        }
        if terminal_idx.len() > max_count {
            for &i in &terminal_idx[..terminal_idx.len() - max_count] {
                to_remove.insert(i);
            }
        }

        if to_remove.is_empty() {
            return Ok(0);
        }
        let removed = to_remove.len();
        let mut kept = Vec::with_capacity(records.len() - removed);
        for (i, r) in records.drain(..).enumerate() {
            if !to_remove.contains(&i) {
                kept.push(r);
            }
        }
        persist(&self.path, &kept)?;
        let mut cache = self.cache.lock();
        cache.clear();
        for r in &kept {
            cache.insert(r.spawn_id.clone(), r.clone());
        }
        Ok(removed)
    }
}

fn load(path: &Path) -> Result<Vec<RemoteSpawnRecord>, StoreError> {
    match read_if_exists(path)? {
        Some(bytes) => {
            let doc: Document = serde_json::from_slice(&bytes)?;
            Ok(doc.records)
        }
        None => Ok(Vec::new()),
    }
}

fn persist(path: &Path, records: &[RemoteSpawnRecord]) -> Result<(), StoreError> {
    let doc = Document { schema_version: SCHEMA_VERSION, records: records.to_vec() };
    let bytes = serde_json::to_vec_pretty(&doc)?;
    write_atomic(path, &bytes)
}

#[cfg(test)]
#[path = "remote_spawn_store_tests.rs"]
mod tests;
