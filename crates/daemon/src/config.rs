// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration (spec §6.4): a TOML file plus environment
//! overrides, validated once at startup. A validation failure is reported
//! before any loop starts, never mid-run.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::env;

/// `spawn_policy` (spec §6.4): `auto` runs the poller, one-shot reclaim,
/// and the reconciler; `manual` disables all three and the task store is
/// never consulted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpawnPolicy {
    Auto,
    Manual,
}

impl Default for SpawnPolicy {
    fn default() -> Self {
        Self::Auto
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, toml::de::Error),
    #[error("unknown spawn_policy: {0}")]
    UnknownSpawnPolicy(String),
    #[error("`project` is required when spawn_policy = auto")]
    MissingProject,
    #[error("`branch_prefix` must not be empty unless `solo` is set")]
    MissingBranchPrefix,
}

impl ConfigError {
    /// Every validation failure is a startup-time configuration error
    /// (spec §6.4): exits with the generic failure code before any loop
    /// starts.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

/// Resolved daemon configuration: spec §6.4's table plus the ambient
/// path/override fields a real process needs (state dir, socket path,
/// name allocator override, git reconciler target).
#[derive(Debug, Clone)]
pub struct Config {
    pub project: Option<String>,
    pub spawn_policy: SpawnPolicy,
    pub pool_size: usize,
    pub poll_interval: Duration,
    pub reconcile_interval: Duration,
    pub max_retries: u32,
    pub solo: bool,
    pub spawn_cmd: Vec<String>,
    pub prompt_dir: Option<PathBuf>,
    pub log_dir: PathBuf,
    pub branch_prefix: String,
    pub plan_label: String,
    pub repo_path: PathBuf,
    pub main_ref: String,
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub name_allocator_wordlist: Option<PathBuf>,
}

/// Raw TOML shape. Every field is optional so a partial or absent file is
/// valid; defaults and environment overrides fill the rest.
#[derive(Debug, Deserialize, Default)]
struct RawConfig {
    project: Option<String>,
    spawn_policy: Option<String>,
    pool_size: Option<usize>,
    poll_interval_secs: Option<u64>,
    reconcile_interval_secs: Option<u64>,
    max_retries: Option<u32>,
    solo: Option<bool>,
    spawn_cmd: Option<Vec<String>>,
    prompt_dir: Option<PathBuf>,
    log_dir: Option<PathBuf>,
    branch_prefix: Option<String>,
    plan_label: Option<String>,
    repo_path: Option<PathBuf>,
    main_ref: Option<String>,
    state_dir: Option<PathBuf>,
    socket_path: Option<PathBuf>,
    name_allocator_wordlist: Option<PathBuf>,
}

impl Config {
    /// Load from `path` (if given) plus environment overrides, then
    /// validate (spec §6.4).
    pub fn load(path: Option<&std::path::Path>) -> Result<Self, ConfigError> {
        let raw = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
                toml::from_str(&text).map_err(|e| ConfigError::Parse(path.to_path_buf(), e))?
            }
            None => RawConfig::default(),
        };
        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self, ConfigError> {
        let project = env_override("AETHERFLOW_PROJECT").or(raw.project);

        let spawn_policy = match env_override("AETHERFLOW_SPAWN_POLICY").or(raw.spawn_policy) {
            None => SpawnPolicy::default(),
            Some(s) if s.eq_ignore_ascii_case("auto") => SpawnPolicy::Auto,
            Some(s) if s.eq_ignore_ascii_case("manual") => SpawnPolicy::Manual,
            Some(other) => return Err(ConfigError::UnknownSpawnPolicy(other)),
        };

        let pool_size =
            env_override_parse("AETHERFLOW_POOL_SIZE").or(raw.pool_size).unwrap_or(3);
        let poll_interval = Duration::from_secs(
            env_override_parse("AETHERFLOW_POLL_INTERVAL_SECS")
                .or(raw.poll_interval_secs)
                .unwrap_or(10),
        );
        let reconcile_interval = Duration::from_secs(
            env_override_parse("AETHERFLOW_RECONCILE_INTERVAL_SECS")
                .or(raw.reconcile_interval_secs)
                .unwrap_or(30),
        );
        let max_retries =
            env_override_parse("AETHERFLOW_MAX_RETRIES").or(raw.max_retries).unwrap_or(3);
        let solo = env_override_parse("AETHERFLOW_SOLO").or(raw.solo).unwrap_or(false);
        let spawn_cmd = raw.spawn_cmd.unwrap_or_else(|| vec!["agent-harness".to_string()]);
        let prompt_dir =
            env_override("AETHERFLOW_PROMPT_DIR").map(PathBuf::from).or(raw.prompt_dir);
        let branch_prefix = env_override("AETHERFLOW_BRANCH_PREFIX")
            .or(raw.branch_prefix)
            .unwrap_or_else(|| "agent".to_string());
        let plan_label = env_override("AETHERFLOW_PLAN_LABEL")
            .or(raw.plan_label)
            .unwrap_or_else(|| "plan".to_string());
        let repo_path = env_override("AETHERFLOW_REPO_PATH")
            .map(PathBuf::from)
            .or(raw.repo_path)
            .unwrap_or_else(|| PathBuf::from("."));
        let main_ref = env_override("AETHERFLOW_MAIN_REF")
            .or(raw.main_ref)
            .unwrap_or_else(|| "origin/main".to_string());

        let state_dir = env_override("AETHERFLOW_STATE_DIR")
            .map(PathBuf::from)
            .or(raw.state_dir)
            .unwrap_or_else(|| {
                let mut dir = env::base_state_dir();
                if let Some(project) = &project {
                    dir = dir.join(project);
                }
                dir
            });

        let log_dir = raw.log_dir.unwrap_or_else(|| state_dir.join("logs"));

        let socket_path = env_override("AETHERFLOW_SOCKET_PATH")
            .map(PathBuf::from)
            .or(raw.socket_path)
            .unwrap_or_else(|| state_dir.join("daemon.sock"));

        let name_allocator_wordlist = env_override("AETHERFLOW_NAME_WORDLIST")
            .map(PathBuf::from)
            .or(raw.name_allocator_wordlist);

        let config = Self {
            project,
            spawn_policy,
            pool_size,
            poll_interval,
            reconcile_interval,
            max_retries,
            solo,
            spawn_cmd,
            prompt_dir,
            log_dir,
            branch_prefix,
            plan_label,
            repo_path,
            main_ref,
            state_dir,
            socket_path,
            name_allocator_wordlist,
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.spawn_policy == SpawnPolicy::Auto && self.project.is_none() {
            return Err(ConfigError::MissingProject);
        }
        if !self.solo && self.branch_prefix.trim().is_empty() {
            return Err(ConfigError::MissingBranchPrefix);
        }
        Ok(())
    }
}

fn env_override(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn env_override_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_override(key).and_then(|s| s.parse().ok())
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
