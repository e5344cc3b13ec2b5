// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC response envelope (spec §6.1, §7).

use af_core::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `{success, result?, error?}` as described in spec §6.1.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Response {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<ErrorCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(result: impl Serialize) -> Self {
        Self {
            success: true,
            result: serde_json::to_value(result).ok(),
            code: None,
            error: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self { success: true, result: None, code: None, error: None }
    }

    pub fn err(code: ErrorCode, message: impl Into<String>) -> Self {
        Self { success: false, result: None, code: Some(code), error: Some(message.into()) }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
