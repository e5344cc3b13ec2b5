// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable store error type (spec §7: maps onto `STORE_ERROR`/`CONFLICT`).

use af_core::ErrorCode;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("advisory lock contended: {0}")]
    LockContended(String),

    #[error("idempotency key conflict: existing record has a different payload")]
    Conflict,
}

impl StoreError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Conflict => ErrorCode::Conflict,
            _ => ErrorCode::StoreError,
        }
    }
}
