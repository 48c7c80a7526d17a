//! In-memory implementation of [`OperationStore`].
//!
//! Backs unit and integration tests where a real Postgres connection is
//! either unavailable or irrelevant.  A plain mutex-guarded map is enough:
//! callers only ever touch single rows, and holding the lock across each
//! method gives the same read-after-write visibility the Postgres
//! implementation provides.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::models::{Operation, OperationState};
use crate::{OperationStore, StoreError};

/// [`OperationStore`] over a `Mutex<HashMap>`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: Mutex<HashMap<String, Operation>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with an existing record (test fixture helper).
    pub fn seed(&self, op: Operation) {
        self.rows.lock().unwrap().insert(op.id.clone(), op);
    }
}

#[async_trait]
impl OperationStore for MemoryStore {
    async fn create(&self, op: &Operation) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        if rows.contains_key(&op.id) {
            return Err(StoreError::AlreadyExists);
        }
        rows.insert(op.id.clone(), op.clone());
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Operation, StoreError> {
        self.rows
            .lock()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn get_latest(&self) -> Result<Operation, StoreError> {
        self.rows
            .lock()
            .unwrap()
            .values()
            .max_by_key(|op| op.created_at)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn update_state(&self, id: &str, state: OperationState) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let op = rows.get_mut(id).ok_or(StoreError::NotFound)?;
        op.state = state;
        op.updated_at = Utc::now();
        Ok(())
    }

    async fn update_step(
        &self,
        id: &str,
        step: i32,
        state: OperationState,
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().unwrap();
        let op = rows.get_mut(id).ok_or(StoreError::NotFound)?;
        op.step = step;
        op.state = state;
        op.updated_at = Utc::now();
        Ok(())
    }

    async fn list_unfinished(&self) -> Result<Vec<Operation>, StoreError> {
        let mut unfinished: Vec<Operation> = self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|op| !op.state.is_terminal())
            .cloned()
            .collect();
        unfinished.sort_by_key(|op| op.created_at);
        Ok(unfinished)
    }
}
