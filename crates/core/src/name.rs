// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Name allocator: unique, collision-free human-readable agent identifiers
//! (spec §2 "Name allocator", SPEC_FULL §2).

use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

const ADJECTIVES: &[&str] =
    &["brave", "calm", "eager", "fuzzy", "gentle", "hardy", "keen", "lucky", "mellow", "nimble"];
const NOUNS: &[&str] =
    &["otter", "falcon", "badger", "heron", "lynx", "marmot", "osprey", "raven", "vole", "wren"];

pub type AgentName = String;

/// Hands out unique agent names and releases them on termination
/// (spec I3: agent ids are unique among live records; released on reap).
#[derive(Clone)]
pub struct NameAllocator {
    adjectives: Arc<Vec<String>>,
    nouns: Arc<Vec<String>>,
    inner: Arc<Mutex<Inner>>,
}

struct Inner {
    live: HashSet<AgentName>,
    /// Bumped every time the base word-list pool is exhausted, so allocation
    /// never fails (SPEC_FULL §2).
    overflow: u64,
}

impl Default for NameAllocator {
    fn default() -> Self {
        Self::new()
    }
}

impl NameAllocator {
    pub fn new() -> Self {
        Self {
            adjectives: Arc::new(ADJECTIVES.iter().map(|s| s.to_string()).collect()),
            nouns: Arc::new(NOUNS.iter().map(|s| s.to_string()).collect()),
            inner: Arc::new(Mutex::new(Inner { live: HashSet::new(), overflow: 0 })),
        }
    }

    /// Override the built-in adjective/noun pools, e.g. from the daemon's
    /// `name_allocator_wordlist` config option (SPEC_FULL §1.3). An empty
    /// list on either side falls back to the built-in for that side.
    pub fn with_wordlists(adjectives: Vec<String>, nouns: Vec<String>) -> Self {
        let adjectives =
            if adjectives.is_empty() { ADJECTIVES.iter().map(|s| s.to_string()).collect() } else { adjectives };
        let nouns = if nouns.is_empty() { NOUNS.iter().map(|s| s.to_string()).collect() } else { nouns };
        Self {
            adjectives: Arc::new(adjectives),
            nouns: Arc::new(nouns),
            inner: Arc::new(Mutex::new(Inner { live: HashSet::new(), overflow: 0 })),
        }
    }

    /// Allocate a fresh, unique name.
    pub fn allocate(&self) -> AgentName {
        let mut inner = self.inner.lock();
        for adj in self.adjectives.iter() {
            for noun in self.nouns.iter() {
                let candidate = format!("{adj}-{noun}");
                if !inner.live.contains(&candidate) {
                    inner.live.insert(candidate.clone());
                    return candidate;
                }
            }
        }
        loop {
            inner.overflow += 1;
            let candidate = format!("agent-{}", inner.overflow);
            if !inner.live.contains(&candidate) {
                inner.live.insert(candidate.clone());
                return candidate;
            }
        }
    }

    /// Release a name so it may be reused. Idempotent.
    pub fn release(&self, name: &str) {
        self.inner.lock().live.remove(name);
    }

    pub fn is_live(&self, name: &str) -> bool {
        self.inner.lock().live.contains(name)
    }
}

#[cfg(test)]
#[path = "name_tests.rs"]
mod tests;
