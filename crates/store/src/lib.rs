//! `store` crate — durable persistence for operation records.
//!
//! Provides the `Operation` model, the `OperationStore` trait, and two
//! implementations: `PgStore` (Postgres via sqlx) and `MemoryStore`
//! (in-process, used by tests and local runs).  No workflow logic lives here.

pub mod error;
pub mod memory;
pub mod models;
pub mod pg;

use async_trait::async_trait;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{Operation, OperationState};
pub use pg::{create_pool, run_migrations, DbPool, PgStore};

/// Contract for the operation record store.
///
/// Shared between the engine, the recovery scanner, and the status-check
/// path, so implementations must be safe under concurrent callers and
/// guarantee read-after-write visibility on a single backing instance.
#[async_trait]
pub trait OperationStore: Send + Sync {
    /// Insert a new operation. Fails with [`StoreError::AlreadyExists`]
    /// if the id collides with an existing row.
    async fn create(&self, op: &Operation) -> Result<(), StoreError>;

    /// Fetch an operation by id.
    async fn get(&self, id: &str) -> Result<Operation, StoreError>;

    /// Fetch the most recently created operation.
    ///
    /// Fails with [`StoreError::NotFound`] when the store is empty.
    async fn get_latest(&self) -> Result<Operation, StoreError>;

    /// Update only the state of an operation, refreshing `updated_at`.
    async fn update_state(&self, id: &str, state: OperationState) -> Result<(), StoreError>;

    /// Update the step and state of an operation, refreshing `updated_at`.
    async fn update_step(
        &self,
        id: &str,
        step: i32,
        state: OperationState,
    ) -> Result<(), StoreError>;

    /// Return every operation in a non-terminal state (`PENDING` or
    /// `RUNNING`), oldest first.  This is the recovery scanner's query.
    async fn list_unfinished(&self) -> Result<Vec<Operation>, StoreError>;
}
