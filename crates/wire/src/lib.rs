// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! af-wire: the RPC protocol carried over the local stream transport
//! (spec §6.1).
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload, matching
//! the daemon's existing IPC convention.

mod framing;
mod request;
mod response;
mod types;

pub use framing::{read_message, write_message, FramingError};
pub use request::Request;
pub use response::Response;
pub use types::{
    AgentDetail, AgentStatus, EventEnvelope, FullStatus, SpawnDeregisterParams,
    SpawnRegisterParams, ToolCallSummary,
};
