//! Start and status-check handlers.
//!
//! The axum wrappers stay thin; the façade logic lives in `start_inner` /
//! `check_inner` so tests can drive it without a socket.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;
use uuid::Uuid;

use store::Operation;

use crate::AppState;

#[derive(Deserialize)]
pub struct StartOperationDto {
    /// Opaque request data, stored alongside the operation.
    pub payload: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct StartedDto {
    pub operation_id: String,
}

#[derive(Debug, Serialize)]
pub struct OperationStatusDto {
    pub operation_id: String,
    pub current_step: i32,
    pub total_steps: i32,
    pub state: String,
    pub completed: bool,
}

// ---------------------------------------------------------------------------
// Axum wrappers
// ---------------------------------------------------------------------------

pub async fn start(
    State(state): State<AppState>,
    Json(dto): Json<StartOperationDto>,
) -> Result<(StatusCode, Json<StartedDto>), StatusCode> {
    let started = start_inner(&state, dto).await?;
    Ok((StatusCode::ACCEPTED, Json(started)))
}

pub async fn check(
    Path(id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<OperationStatusDto>, StatusCode> {
    check_inner(&state, &id).await.map(Json)
}

pub async fn check_latest(
    State(state): State<AppState>,
) -> Result<Json<OperationStatusDto>, StatusCode> {
    // An empty id delegates to the most recently created operation.
    check_inner(&state, "").await.map(Json)
}

// ---------------------------------------------------------------------------
// Façade logic
// ---------------------------------------------------------------------------

/// Validate the request, persist a `PENDING` record, and launch processing
/// in the background.  The caller gets the id back immediately.
pub async fn start_inner(
    state: &AppState,
    dto: StartOperationDto,
) -> Result<StartedDto, StatusCode> {
    // Validation happens before any side effect.
    let payload = match dto.payload {
        Some(p) if !p.is_null() => p,
        _ => return Err(StatusCode::BAD_REQUEST),
    };

    let id = Uuid::new_v4().to_string();
    let initial = state.processor.sequence().initial_step();
    let op = Operation::new(id.clone(), payload, initial);

    if let Err(e) = state.store.create(&op).await {
        error!(operation = %id, error = %e, "failed to persist new operation");
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    // Fire-and-forget: the processor persists the terminal outcome itself,
    // so here a failure is only worth a log line.
    let processor = state.processor.clone();
    let op_id = id.clone();
    tokio::spawn(async move {
        if let Err(e) = processor.run(&op_id).await {
            error!(operation = %op_id, error = %e, "operation failed");
        }
    });

    Ok(StartedDto { operation_id: id })
}

/// Report progress for one operation, or for the newest one when `id` is
/// empty.  Every store failure surfaces as 404: the boundary does not
/// distinguish "never existed" from "store unavailable".
pub async fn check_inner(state: &AppState, id: &str) -> Result<OperationStatusDto, StatusCode> {
    let lookup = if id.is_empty() {
        state.store.get_latest().await
    } else {
        state.store.get(id).await
    };

    let op = lookup.map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(OperationStatusDto {
        operation_id: op.id,
        current_step: op.step,
        total_steps: state.processor.sequence().terminal_step(),
        state: op.state.to_string(),
        completed: op.state.is_terminal(),
    })
}
