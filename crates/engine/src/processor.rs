//! Operation processing engine.
//!
//! `OperationProcessor` is the state-machine core:
//! 1. Re-reads the operation record from the store on every iteration, so
//!    the processor itself is stateless between calls and a restart resumes
//!    from the last durably-recorded step.
//! 2. Dispatches the current step to its handler from the step sequence.
//! 3. Persists `(next step, state)` after every single transition.
//! 4. On handler failure, best-effort persists `FAILED` and surfaces the
//!    handler error.

use std::sync::Arc;

use tracing::{error, info, instrument};

use store::{OperationState, OperationStore, StoreError};
use users::UserClient;

use crate::locks::LockMap;
use crate::sequence::StepSequence;
use crate::EngineError;

/// Upper bound on step transitions within one `run` invocation.  A correct
/// sequence terminates well below this; hitting it means the sequence is
/// cyclic or misconfigured.
const MAX_TRANSITIONS: usize = 32;

/// Stateless orchestrator that drives one operation through its steps.
///
/// Shared behind an `Arc` by the request façade and the recovery scanner;
/// the embedded [`LockMap`] serializes runs per operation id across both
/// entry points.
pub struct OperationProcessor {
    store: Arc<dyn OperationStore>,
    users: Arc<dyn UserClient>,
    sequence: StepSequence,
    pub(crate) locks: LockMap,
}

impl OperationProcessor {
    pub fn new(
        store: Arc<dyn OperationStore>,
        users: Arc<dyn UserClient>,
        sequence: StepSequence,
    ) -> Self {
        Self {
            store,
            users,
            sequence,
            locks: LockMap::new(),
        }
    }

    pub fn sequence(&self) -> &StepSequence {
        &self.sequence
    }

    /// Drive the operation until a terminal step or a handler failure,
    /// waiting for the per-id lease if another run is in flight.
    ///
    /// Running an already-terminal operation is a no-op.
    ///
    /// # Errors
    /// [`EngineError::OperationNotFound`] if no record exists;
    /// [`EngineError::UnknownStep`] for an unregistered step ordinal;
    /// [`EngineError::Step`] when a handler fails (the operation is then
    /// marked `FAILED`).
    pub async fn run(&self, id: &str) -> Result<(), EngineError> {
        let lease = self.locks.handle(id);
        let _guard = lease.lock().await;
        self.run_locked(id).await
    }

    /// Like [`run`](Self::run), but skips instead of waiting when the lease
    /// is already held.  Returns `false` on skip.  Used by the recovery
    /// scanner so a tick never queues behind a live run.
    pub async fn try_run(&self, id: &str) -> Result<bool, EngineError> {
        let lease = self.locks.handle(id);
        let guard = match lease.try_lock() {
            Ok(g) => g,
            Err(_) => return Ok(false),
        };
        let _guard = guard;
        self.run_locked(id).await.map(|()| true)
    }

    #[instrument(skip(self), fields(operation = id))]
    async fn run_locked(&self, id: &str) -> Result<(), EngineError> {
        for _ in 0..MAX_TRANSITIONS {
            let op = self.store.get(id).await.map_err(|e| match e {
                StoreError::NotFound => EngineError::OperationNotFound(id.to_owned()),
                other => EngineError::Store(other),
            })?;

            // Idempotent no-op on already-finished operations.  Closes the
            // race where a scanner tick targets an operation that completed
            // after the scan query.
            if op.state.is_terminal() {
                return Ok(());
            }

            let unknown_step = || EngineError::UnknownStep {
                id: id.to_owned(),
                step: op.step,
            };
            let slot = self.sequence.slot(op.step).ok_or_else(unknown_step)?;
            let handler = slot.handler.as_ref().ok_or_else(unknown_step)?;

            info!(step = slot.name, "running step");

            match handler.run(&op, self.users.as_ref()).await {
                Ok(()) => {
                    let next = op.step + 1;
                    if next == self.sequence.terminal_step() {
                        self.store
                            .update_step(id, next, OperationState::Completed)
                            .await?;
                        info!("operation completed");
                        return Ok(());
                    }
                    self.store
                        .update_step(id, next, OperationState::Running)
                        .await?;
                }
                Err(step_err) => {
                    // Best-effort: a secondary persistence failure must not
                    // mask the handler error.
                    if let Err(persist_err) =
                        self.store.update_state(id, OperationState::Failed).await
                    {
                        error!(error = %persist_err, "could not persist FAILED state");
                    }
                    return Err(EngineError::Step {
                        step: slot.name,
                        source: step_err,
                    });
                }
            }
        }

        Err(EngineError::TransitionLimit {
            id: id.to_owned(),
            limit: MAX_TRANSITIONS,
        })
    }
}
