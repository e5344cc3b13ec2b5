// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! RPC listener: accepts local stream connections and dispatches one
//! request per connection (spec §6.1).

use std::sync::Arc;

use af_wire::{read_message, write_message, FramingError, Request, Response};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::dispatch::dispatch;
use crate::startup::DaemonState;

/// Run the accept loop until `shutdown` is cancelled, spawning one task
/// per connection (spec §5, §6.1).
pub async fn run_listener(listener: UnixListener, state: Arc<DaemonState>, shutdown: CancellationToken) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                debug!("listener shutting down");
                return;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, _addr)) => {
                        let state = Arc::clone(&state);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, &state).await {
                                log_connection_error(e);
                            }
                        });
                    }
                    Err(e) => warn!(error = %e, "accept failed"),
                }
            }
        }
    }
}

async fn handle_connection(mut stream: UnixStream, state: &DaemonState) -> Result<(), FramingError> {
    let (mut reader, mut writer) = stream.split();
    let request: Request = read_message(&mut reader).await?;
    debug!(?request, "dispatching request");
    let response: Response = dispatch(state, request).await;
    write_message(&mut writer, &response).await?;
    Ok(())
}

fn log_connection_error(e: FramingError) {
    match e {
        FramingError::Closed => debug!("client disconnected before sending a request"),
        other => warn!(error = %other, "connection error"),
    }
}

#[cfg(test)]
#[path = "listener_tests.rs"]
mod tests;
