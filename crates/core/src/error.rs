// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Stable error categories shared by every crate boundary (spec §7).
//!
//! These are the codes the RPC surface returns verbatim; every crate-local
//! error type (`WorkSourceError`, `StoreError`, `LaunchError`, ...) maps onto
//! one of these rather than inventing its own wire-visible taxonomy.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Stable error category returned as `{success:false, code, error}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Validation failure: caps exceeded, path traversal, unknown enum,
    /// unresolved template variable.
    InvalidInput,
    /// Agent, session, or spawn absent from the respective registry.
    NotFound,
    /// Idempotency-key collision in the remote-spawn store, or duplicate
    /// registration.
    Conflict,
    /// Spawn registry cap reached.
    RegistryFull,
    /// Attach requested for a spawn whose session id is not yet bound.
    SessionNotReady,
    /// Durable store read/write failure.
    StoreError,
    /// Error propagated from a provider boundary (outside the core).
    ProviderError,
    /// Bounded operation exceeded its deadline.
    Timeout,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::InvalidInput => "INVALID_INPUT",
            Self::NotFound => "NOT_FOUND",
            Self::Conflict => "CONFLICT",
            Self::RegistryFull => "REGISTRY_FULL",
            Self::SessionNotReady => "SESSION_NOT_READY",
            Self::StoreError => "STORE_ERROR",
            Self::ProviderError => "PROVIDER_ERROR",
            Self::Timeout => "TIMEOUT",
        };
        f.write_str(s)
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown error code: {0}")]
pub struct ErrorCodeParseError(String);

impl FromStr for ErrorCode {
    type Err = ErrorCodeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INVALID_INPUT" => Ok(Self::InvalidInput),
            "NOT_FOUND" => Ok(Self::NotFound),
            "CONFLICT" => Ok(Self::Conflict),
            "REGISTRY_FULL" => Ok(Self::RegistryFull),
            "SESSION_NOT_READY" => Ok(Self::SessionNotReady),
            "STORE_ERROR" => Ok(Self::StoreError),
            s if s.starts_with("PROVIDER_") => Ok(Self::ProviderError),
            "TIMEOUT" => Ok(Self::Timeout),
            other => Err(ErrorCodeParseError(other.to_string())),
        }
    }
}

/// Well-known CLI exit codes for stable error categories (spec §6.4).
impl ErrorCode {
    pub fn exit_code(self) -> i32 {
        match self {
            Self::SessionNotReady => 3,
            Self::NotFound => 4,
            Self::Conflict => 5,
            Self::RegistryFull => 6,
            Self::Timeout => 7,
            Self::InvalidInput => 8,
            Self::StoreError | Self::ProviderError => 1,
        }
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
