//! Per-operation execution leases.
//!
//! The processor's read-modify-persist loop is not transactionally isolated,
//! so two concurrent runs of the same operation could double-apply a step.
//! `LockMap` hands out one async mutex per operation id; holding it for the
//! duration of `run` gives the system-wide at-most-one-runner guarantee.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Arena of operation id → lock handle.  Entries are never evicted; one
/// small allocation per operation id.
#[derive(Default)]
pub struct LockMap {
    inner: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl LockMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the lock handle for `id`, creating it on first use.
    pub fn handle(&self, id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut inner = self.inner.lock().unwrap();
        inner
            .entry(id.to_owned())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
