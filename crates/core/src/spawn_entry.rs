// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Ad-hoc spawn-registry entries (spec §3 "Spawn entry", §4.8).

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Maximum number of live spawn-registry entries (spec I6).
pub const MAX_SPAWN_ENTRIES: usize = 128;
/// Maximum accepted prompt length, in bytes.
pub const MAX_PROMPT_BYTES: usize = 8 * 1024;
/// Maximum derived log-path length, in bytes.
pub const MAX_LOG_PATH_BYTES: usize = 4 * 1024;
/// Maximum accepted spawn id length, in characters.
pub const MAX_SPAWN_ID_CHARS: usize = 128;

/// An externally spawned session registered out-of-band via `spawn.register`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpawnEntry {
    pub spawn_id: String,
    pub pid: u32,
    pub prompt: String,
    /// Always server-derived from `log_dir`/`spawn_id` — never client-supplied
    /// (closes a path-traversal vector, spec §4.8).
    pub log_path: PathBuf,
    pub created_at_ms: u64,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SpawnEntryError {
    #[error("spawn id exceeds {MAX_SPAWN_ID_CHARS} characters")]
    IdTooLong,
    #[error("spawn id must not be empty")]
    IdEmpty,
    #[error("prompt exceeds {MAX_PROMPT_BYTES} bytes")]
    PromptTooLarge,
}

impl SpawnEntry {
    /// Validate the id/prompt fields against the hard caps. `log_path` is
    /// assumed to already be server-derived and is not re-validated here.
    pub fn validate(spawn_id: &str, prompt: &str) -> Result<(), SpawnEntryError> {
        if spawn_id.is_empty() {
            return Err(SpawnEntryError::IdEmpty);
        }
        if spawn_id.chars().count() > MAX_SPAWN_ID_CHARS {
            return Err(SpawnEntryError::IdTooLong);
        }
        if prompt.len() > MAX_PROMPT_BYTES {
            return Err(SpawnEntryError::PromptTooLarge);
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "spawn_entry_tests.rs"]
mod tests;
