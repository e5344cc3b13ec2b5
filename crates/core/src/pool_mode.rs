// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pool mode state machine (spec §4.2).

use serde::{Deserialize, Serialize};

/// Governs whether the poller schedules new work and whether crashed
/// sessions are respawned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PoolMode {
    Active,
    Draining,
    Paused,
}

impl Default for PoolMode {
    fn default() -> Self {
        Self::Active
    }
}

impl PoolMode {
    pub fn schedules_new_work(self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn respawns_on_crash(self) -> bool {
        matches!(self, Self::Active | Self::Draining)
    }

    /// Validate a transition per the table in spec §4.2. There is no edge
    /// from `paused` to `draining`.
    pub fn can_transition_to(self, next: PoolMode) -> bool {
        use PoolMode::*;
        matches!(
            (self, next),
            (Active, Draining)
                | (Active, Paused)
                | (Draining, Active)
                | (Draining, Paused)
                | (Paused, Active)
        ) || self == next
    }
}

impl std::fmt::Display for PoolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Draining => write!(f, "draining"),
            Self::Paused => write!(f, "paused"),
        }
    }
}

#[cfg(test)]
#[path = "pool_mode_tests.rs"]
mod tests;
