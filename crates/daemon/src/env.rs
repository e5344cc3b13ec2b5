// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve the base state directory: `AETHERFLOW_STATE_DIR` >
/// `XDG_STATE_HOME/aetherflow` > the platform data dir.
pub fn base_state_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("AETHERFLOW_STATE_DIR") {
        return PathBuf::from(dir);
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return PathBuf::from(xdg).join("aetherflow");
    }
    dirs::data_dir().unwrap_or_else(|| PathBuf::from(".")).join("aetherflow")
}

/// Per-call timeout for task-store operations (spec §5), overridable via
/// `AETHERFLOW_IPC_TIMEOUT_MS`.
pub fn work_source_timeout() -> Duration {
    std::env::var("AETHERFLOW_IPC_TIMEOUT_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
        .unwrap_or(af_adapters::DEFAULT_TIMEOUT)
}

/// Path to the TOML config file, overridable via `AETHERFLOW_CONFIG`.
/// `None` means start from built-in defaults plus environment overrides.
pub fn config_path() -> Option<PathBuf> {
    std::env::var("AETHERFLOW_CONFIG").ok().map(PathBuf::from)
}
