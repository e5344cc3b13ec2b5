// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Plugin event ingress (spec §4.6, I4).
//!
//! Binds an agent's first session-carrying event to its record, publishes
//! the session-registry record for that binding, and appends every event
//! (bound or not) to its session's ring. Never applies heuristic binding
//! (Design Note §9): an event with no session id and an unbound agent is
//! dropped for that agent, not guessed at.

use af_adapters::{Launcher, WorkSource};
use af_core::{Clock, EventType, OriginType, SessionRecord, SessionStatus};
use af_storage::SessionRegistryStore;
use std::sync::Arc;
use tracing::warn;

use crate::events::EventBufferRegistry;
use crate::pool::AgentPool;

/// What happened to an ingested event, for the RPC layer to report back
/// (and for tests to assert against).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestOutcome {
    /// The event carried no session id and the agent has none bound yet;
    /// nothing was recorded.
    DroppedUnbound,
    /// The event carried a session id that conflicts with the agent's
    /// already-bound one (I4: binding is immutable); nothing was recorded.
    DroppedConflict,
    /// Recorded into the session's ring; no new binding occurred.
    Recorded,
    /// This event performed the agent's first session binding.
    Bound,
    /// The agent record does not exist (already reaped, or spawn-registry
    /// entry with no daemon-side agent record).
    UnknownAgent,
}

/// Ingest one plugin event for `agent_id` (spec §4.6 "Push").
///
/// `server_ref` identifies this daemon's stream endpoint for session-
/// registry keys (spec §3). `project` tags the registry record so it
/// can be filtered by callers that enumerate sessions per project.
#[allow(clippy::too_many_arguments)]
pub async fn ingest_event<W, L, C>(
    pool: &Arc<AgentPool<W, L, C>>,
    events: &EventBufferRegistry,
    sessions: &SessionRegistryStore,
    server_ref: &str,
    project: Option<&str>,
    agent_id: &str,
    event: EventType,
    received_at_ms: u64,
) -> Result<IngestOutcome, crate::events::IngressError>
where
    W: WorkSource + 'static,
    L: Launcher + 'static,
    C: Clock + 'static,
{
    let Some(record) = pool.get(agent_id).await else {
        return Ok(IngestOutcome::UnknownAgent);
    };

    let incoming_session_id = event.session_id();
    let already_bound = record.session_id.is_some();

    let Some(session_id) = incoming_session_id.clone().or(record.session_id.clone()) else {
        return Ok(IngestOutcome::DroppedUnbound);
    };

    let mut outcome = IngestOutcome::Recorded;
    if let Some(incoming) = &incoming_session_id {
        let bound = pool.bind_session(agent_id, incoming).await;
        if !bound {
            warn!(
                agent_id, incoming = %incoming,
                "dropping event carrying a session id that conflicts with the agent's bound session"
            );
            return Ok(IngestOutcome::DroppedConflict);
        }
        if !already_bound {
            outcome = IngestOutcome::Bound;
            publish_binding(
                sessions,
                server_ref,
                project,
                &record.task_id,
                agent_id,
                incoming,
                received_at_ms,
            );
        }
    }

    if let Some(update) = event.registry_status() {
        update_status(sessions, server_ref, &session_id, update, received_at_ms);
    } else {
        touch_last_seen(sessions, server_ref, &session_id, received_at_ms);
    }

    let ring = events.ring_for(&session_id);
    ring.push(&session_id, event, received_at_ms)?;
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn publish_binding(
    sessions: &SessionRegistryStore,
    server_ref: &str,
    project: Option<&str>,
    task_id: &str,
    agent_id: &str,
    session_id: &str,
    now_ms: u64,
) {
    let record = SessionRecord {
        server_ref: server_ref.to_string(),
        session_id: session_id.to_string(),
        directory: None,
        project: project.map(str::to_string),
        origin_type: OriginType::Pool,
        work_ref: Some(task_id.to_string()),
        agent_id: Some(agent_id.to_string()),
        status: SessionStatus::Active,
        created_at_ms: now_ms,
        last_seen_at_ms: now_ms,
        updated_at_ms: now_ms,
        extra: serde_json::Map::new(),
    };
    if let Err(e) = sessions.upsert(record) {
        warn!(session_id, error = %e, "failed to publish session-registry binding");
    }
}

fn update_status(
    sessions: &SessionRegistryStore,
    server_ref: &str,
    session_id: &str,
    update: af_core::event::SessionStatusUpdate,
    now_ms: u64,
) {
    let Some(mut record) = sessions.get(server_ref, session_id) else { return };
    record.status = match update {
        af_core::event::SessionStatusUpdate::Active => SessionStatus::Active,
        af_core::event::SessionStatusUpdate::Idle => SessionStatus::Idle,
        af_core::event::SessionStatusUpdate::Terminated => SessionStatus::Terminated,
        af_core::event::SessionStatusUpdate::Stale => SessionStatus::Stale,
    };
    record.last_seen_at_ms = now_ms;
    record.updated_at_ms = now_ms;
    if let Err(e) = sessions.upsert(record) {
        warn!(session_id, error = %e, "failed to update session-registry status");
    }
}

fn touch_last_seen(sessions: &SessionRegistryStore, server_ref: &str, session_id: &str, now_ms: u64) {
    let Some(mut record) = sessions.get(server_ref, session_id) else { return };
    record.last_seen_at_ms = now_ms;
    if let Err(e) = sessions.upsert(record) {
        warn!(session_id, error = %e, "failed to touch session last_seen_at");
    }
}

#[cfg(test)]
#[path = "ingress_tests.rs"]
mod tests;
