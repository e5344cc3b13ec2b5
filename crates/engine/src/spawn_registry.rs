// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory table of externally spawned (not pool-managed) sessions
//! (spec §2 "Spawn registry", §3 "Spawn entry", §4.8, I6).

use af_adapters::launcher::is_alive;
use af_core::spawn_entry::{SpawnEntryError, MAX_SPAWN_ENTRIES};
use af_core::{ErrorCode, SpawnEntry};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum SpawnRegistryError {
    #[error(transparent)]
    Validation(#[from] SpawnEntryError),
    #[error("spawn registry is full ({MAX_SPAWN_ENTRIES} entries)")]
    Full,
    #[error("duplicate spawn id {0}")]
    Duplicate(String),
    #[error("spawn id {0} not found")]
    NotFound(String),
}

impl SpawnRegistryError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Validation(_) => ErrorCode::InvalidInput,
            Self::Full => ErrorCode::RegistryFull,
            Self::Duplicate(_) => ErrorCode::Conflict,
            Self::NotFound(_) => ErrorCode::NotFound,
        }
    }
}

/// Ad-hoc spawn registry, bounded by `MAX_SPAWN_ENTRIES` (spec I6).
#[derive(Default)]
pub struct SpawnRegistry {
    entries: RwLock<HashMap<String, SpawnEntry>>,
    log_dir: PathBuf,
}

impl SpawnRegistry {
    pub fn new(log_dir: PathBuf) -> Self {
        Self { entries: RwLock::new(HashMap::new()), log_dir }
    }

    /// Register one entry, deriving `log_path` server-side from `log_dir`
    /// and `spawn_id` — never trusting a client-supplied path (closes a
    /// traversal vector, spec §4.8).
    pub fn register(
        &self,
        spawn_id: String,
        pid: u32,
        prompt: String,
        created_at_ms: u64,
    ) -> Result<SpawnEntry, SpawnRegistryError> {
        SpawnEntry::validate(&spawn_id, &prompt)?;
        let mut entries = self.entries.write();
        if entries.contains_key(&spawn_id) {
            return Err(SpawnRegistryError::Duplicate(spawn_id));
        }
        if entries.len() >= MAX_SPAWN_ENTRIES {
            return Err(SpawnRegistryError::Full);
        }
        let log_path = derive_log_path(&self.log_dir, &spawn_id);
        let entry = SpawnEntry { spawn_id: spawn_id.clone(), pid, prompt, log_path, created_at_ms };
        entries.insert(spawn_id, entry.clone());
        Ok(entry)
    }

    pub fn deregister(&self, spawn_id: &str) -> Result<(), SpawnRegistryError> {
        self.entries
            .write()
            .remove(spawn_id)
            .map(|_| ())
            .ok_or_else(|| SpawnRegistryError::NotFound(spawn_id.to_string()))
    }

    pub fn get(&self, spawn_id: &str) -> Option<SpawnEntry> {
        self.entries.read().get(spawn_id).cloned()
    }

    pub fn list(&self) -> Vec<SpawnEntry> {
        self.entries.read().values().cloned().collect()
    }

    /// Drop entries whose PID is dead (spec §4.1 "Sweeper" / §4.8).
    pub fn sweep_dead(&self) -> usize {
        let mut entries = self.entries.write();
        let dead: Vec<String> =
            entries.values().filter(|e| !is_alive(e.pid)).map(|e| e.spawn_id.clone()).collect();
        for id in &dead {
            entries.remove(id);
        }
        dead.len()
    }
}

fn derive_log_path(log_dir: &Path, spawn_id: &str) -> PathBuf {
    log_dir.join(format!("{}.jsonl", sanitize(spawn_id)))
}

/// Sanitize an id for use as a filename component, stripping path
/// separators and leading dots so a task/spawn id can never escape
/// `log_dir` (spec §4.1 step 3, §4.8).
pub fn sanitize(id: &str) -> String {
    id.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect::<String>()
        .trim_start_matches('.')
        .to_string()
}

#[cfg(test)]
#[path = "spawn_registry_tests.rs"]
mod tests;
