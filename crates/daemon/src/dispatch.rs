// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Request dispatch: the `Request` → `Response` mapping for every method
//! in spec §6.1's table.

use af_core::{ErrorCode, EventType, PoolMode, SessionEvent};
use af_engine::{build_agent_status, build_full_status, ingest_event, status::now_ms};
use af_wire::{EventEnvelope, Request, Response};
use tracing::debug;

use crate::config::SpawnPolicy;
use crate::startup::DaemonState;

/// Dispatch one request against the wired daemon state (spec §6.1).
pub async fn dispatch(state: &DaemonState, request: Request) -> Response {
    match request {
        Request::Status => status_full(state).await,
        Request::StatusFull => status_full(state).await,
        Request::StatusAgent { agent_name, limit } => status_agent(state, &agent_name, limit).await,
        Request::LogsPath { agent_name } => logs_path(state, &agent_name).await,
        Request::PoolDrain => mode_transition(state, PoolMode::Draining).await,
        Request::PoolPause => mode_transition(state, PoolMode::Paused).await,
        Request::PoolResume => mode_transition(state, PoolMode::Active).await,
        Request::PoolKill { agent_name } => pool_kill(state, &agent_name).await,
        Request::SpawnRegister { spawn_id, pid, prompt } => spawn_register(state, spawn_id, pid, prompt),
        Request::SpawnDeregister { spawn_id } => spawn_deregister(state, &spawn_id),
        Request::EventsList { session_id, after, limit } => events_list(state, &session_id, after, limit),
        Request::SessionEvent { agent_id, event_type, session_id: _, data } => {
            session_event(state, &agent_id, &event_type, data).await
        }
        Request::Shutdown => {
            state.shutdown.cancel();
            Response::ok_empty()
        }
    }
}

fn work_source(state: &DaemonState) -> Option<&crate::task_store::JsonTaskStore> {
    match state.config.spawn_policy {
        SpawnPolicy::Auto => Some(state.work_source.as_ref()),
        SpawnPolicy::Manual => None,
    }
}

fn spawn_policy_label(state: &DaemonState) -> &'static str {
    match state.config.spawn_policy {
        SpawnPolicy::Auto => "auto",
        SpawnPolicy::Manual => "manual",
    }
}

async fn status_full(state: &DaemonState) -> Response {
    let full = build_full_status(
        &state.pool,
        &state.spawn_registry,
        work_source(state),
        &state.events,
        spawn_policy_label(state),
        state.config.project.as_deref(),
    )
    .await;
    debug!(
        agents_count = full.agents.len(),
        pool_mode = %full.pool_mode,
        "status.full served"
    );
    Response::ok(full)
}

async fn status_agent(state: &DaemonState, agent_name: &str, limit: Option<usize>) -> Response {
    let result = build_agent_status(
        &state.pool,
        &state.spawn_registry,
        work_source(state),
        &state.events,
        agent_name,
        limit.unwrap_or(200),
    )
    .await;
    match result {
        Ok(detail) => {
            debug!(agent_name, "status.agent served");
            Response::ok(detail)
        }
        Err(e) => Response::err(e.code(), e.to_string()),
    }
}

async fn logs_path(state: &DaemonState, agent_name: &str) -> Response {
    if let Some(record) = state.pool.get(agent_name).await {
        return Response::ok(serde_json::json!({ "path": record.log_path }));
    }
    if let Some(entry) = state.spawn_registry.get(agent_name) {
        return Response::ok(serde_json::json!({ "path": entry.log_path }));
    }
    Response::err(ErrorCode::NotFound, format!("agent {agent_name} not found"))
}

async fn mode_transition(state: &DaemonState, next: PoolMode) -> Response {
    match state.pool.transition(next) {
        Ok(mode) => {
            let running = state.pool.status().await.len();
            Response::ok(serde_json::json!({ "mode": mode.to_string(), "running": running }))
        }
        Err(e) => Response::err(e.code(), e.to_string()),
    }
}

async fn pool_kill(state: &DaemonState, agent_name: &str) -> Response {
    match state.pool.kill(agent_name).await {
        Ok((agent_name, pid)) => Response::ok(serde_json::json!({ "agent_name": agent_name, "pid": pid })),
        Err(e) => Response::err(e.code(), e.to_string()),
    }
}

fn spawn_register(state: &DaemonState, spawn_id: String, pid: u32, prompt: String) -> Response {
    match state.spawn_registry.register(spawn_id, pid, prompt, now_ms()) {
        Ok(_entry) => Response::ok_empty(),
        Err(e) => Response::err(e.code(), e.to_string()),
    }
}

fn spawn_deregister(state: &DaemonState, spawn_id: &str) -> Response {
    match state.spawn_registry.deregister(spawn_id) {
        Ok(()) => Response::ok_empty(),
        Err(e) => Response::err(e.code(), e.to_string()),
    }
}

fn events_list(state: &DaemonState, session_id: &str, after: Option<u64>, limit: Option<usize>) -> Response {
    let Some(ring) = state.events.get(session_id) else {
        return Response::ok(Vec::<EventEnvelope>::new());
    };
    let events: Vec<EventEnvelope> =
        ring.list(after, limit.unwrap_or(200)).into_iter().map(to_envelope).collect();
    Response::ok(events)
}

async fn session_event(state: &DaemonState, agent_id: &str, event_type: &str, data: serde_json::Value) -> Response {
    let value = serde_json::json!({ "type": event_type, "data": data });
    let event: EventType = serde_json::from_value(value).unwrap_or(EventType::Unknown);
    let project = state.config.project.as_deref();
    let result = ingest_event(
        &state.pool,
        &state.events,
        &state.sessions,
        &state.server_ref,
        project,
        agent_id,
        event,
        now_ms(),
    )
    .await;
    match result {
        Ok(_outcome) => Response::ok_empty(),
        Err(e) => Response::err(e.code(), e.to_string()),
    }
}

fn to_envelope(e: SessionEvent) -> EventEnvelope {
    let event_type = e.event.type_name().to_string();
    let value = serde_json::to_value(&e.event).unwrap_or(serde_json::Value::Null);
    let data = value.get("data").cloned().unwrap_or(serde_json::Value::Null);
    EventEnvelope { seq: e.seq, event_type, session_id: Some(e.session_id), data }
}

#[cfg(test)]
#[path = "dispatch_tests.rs"]
mod tests;
