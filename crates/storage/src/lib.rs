// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! af-storage: durable on-disk stores for the Aetherflow daemon.
//!
//! Both stores here share one discipline: temp-file-plus-rename writes
//! guarded by a process-level advisory lock with bounded retry (spec §6.3,
//! §7, §9). Neither store knows about the pool; they're pure persistence
//! boundaries consumed by `af-engine`.

mod atomic;
mod error;
mod remote_spawn_store;
mod session_registry;

pub use error::StoreError;
pub use remote_spawn_store::{RemoteSpawnStore, UpsertOutcome};
pub use session_registry::SessionRegistryStore;
