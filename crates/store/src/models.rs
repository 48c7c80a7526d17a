//! Row structs that map 1-to-1 onto the `operations` table.
//!
//! These are *persistence* models — they carry no workflow behaviour.
//! The step sequence and its handlers live in the `engine` crate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// OperationState
// ---------------------------------------------------------------------------

/// Lifecycle state of a long-running operation.
///
/// `Pending` and `Running` are non-terminal; the other three are terminal
/// and immutable once reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationState {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl OperationState {
    /// True once the operation can no longer make progress.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }
}

impl std::fmt::Display for OperationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "PENDING"),
            Self::Running => write!(f, "RUNNING"),
            Self::Completed => write!(f, "COMPLETED"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
        }
    }
}

impl std::str::FromStr for OperationState {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(Self::Pending),
            "RUNNING" => Ok(Self::Running),
            "COMPLETED" => Ok(Self::Completed),
            "FAILED" => Ok(Self::Failed),
            "CANCELLED" => Ok(Self::Cancelled),
            other => Err(format!("unknown operation state: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

/// A persisted operation record — the unit of durable workflow state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Opaque unique identifier, assigned at creation, immutable.
    pub id: String,
    /// Opaque serialized request data (may be an empty object).
    pub payload: serde_json::Value,
    /// Ordinal into the step sequence.
    pub step: i32,
    pub state: OperationState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Operation {
    /// Build a fresh `Pending` record positioned at `initial_step`.
    pub fn new(id: impl Into<String>, payload: serde_json::Value, initial_step: i32) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            payload,
            step: initial_step,
            state: OperationState::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}
