//! Integration tests for the operation processing engine.
//!
//! These tests use `MemoryStore` and `MockUserClient` so no real Postgres
//! connection or user service is required.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use store::{MemoryStore, Operation, OperationState, OperationStore, StoreError};
use users::{ClientError, MockUserClient, NewUser, User, UserClient};

use crate::sequence::{StepSequence, StepSlot};
use crate::steps::StepHandler;
use crate::{EngineError, OperationProcessor, RecoveryScanner};

fn pending_op(id: &str) -> Operation {
    Operation::new(id, json!({}), 0)
}

fn processor(
    store: Arc<MemoryStore>,
    client: Arc<dyn UserClient>,
) -> Arc<OperationProcessor> {
    Arc::new(OperationProcessor::new(
        store,
        client,
        StepSequence::standard(),
    ))
}

// ============================================================
// Happy path
// ============================================================

#[tokio::test]
async fn pending_operation_runs_to_completion() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(3));
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client.clone());
    p.run("op-1").await.expect("operation should complete");

    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Completed);
    assert_eq!(op.step, 4);

    // One list to establish the working set, one re-list before deletion,
    // one delete per listed user, and the fixed create batch.
    assert_eq!(client.list_calls(), 2);
    assert_eq!(client.delete_calls(), 3);
    assert_eq!(client.create_calls(), 5);

    // The collaborator ends up holding exactly the new batch.
    let remaining = client.current_users();
    assert_eq!(remaining.len(), 5);
    assert!(remaining.iter().all(|u| u.id.starts_with("user-")));
}

#[tokio::test]
async fn resumed_operation_continues_from_persisted_step() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(2));

    // Simulates a restart: the record was durably parked at DELETE_USERS.
    let mut op = pending_op("op-1");
    op.step = 2;
    op.state = OperationState::Running;
    store.seed(op);

    let p = processor(store.clone(), client.clone());
    p.run("op-1").await.expect("operation should complete");

    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Completed);
    assert_eq!(op.step, 4);

    // Earlier steps are not redone: only the delete-phase re-list ran.
    assert_eq!(client.list_calls(), 1);
    assert_eq!(client.delete_calls(), 2);
    assert_eq!(client.create_calls(), 5);
}

/// Store wrapper that records every persisted step ordinal.
struct ObservedStore {
    inner: MemoryStore,
    steps: Mutex<Vec<i32>>,
}

#[async_trait]
impl OperationStore for ObservedStore {
    async fn create(&self, op: &Operation) -> Result<(), StoreError> {
        self.inner.create(op).await
    }
    async fn get(&self, id: &str) -> Result<Operation, StoreError> {
        self.inner.get(id).await
    }
    async fn get_latest(&self) -> Result<Operation, StoreError> {
        self.inner.get_latest().await
    }
    async fn update_state(&self, id: &str, state: OperationState) -> Result<(), StoreError> {
        self.inner.update_state(id, state).await
    }
    async fn update_step(
        &self,
        id: &str,
        step: i32,
        state: OperationState,
    ) -> Result<(), StoreError> {
        self.steps.lock().unwrap().push(step);
        self.inner.update_step(id, step, state).await
    }
    async fn list_unfinished(&self) -> Result<Vec<Operation>, StoreError> {
        self.inner.list_unfinished().await
    }
}

#[tokio::test]
async fn persisted_step_ordinals_are_strictly_increasing() {
    let store = Arc::new(ObservedStore {
        inner: MemoryStore::new(),
        steps: Mutex::new(Vec::new()),
    });
    store.inner.seed(pending_op("op-1"));

    let p = Arc::new(OperationProcessor::new(
        store.clone(),
        Arc::new(MockUserClient::new()),
        StepSequence::standard(),
    ));
    p.run("op-1").await.unwrap();

    // One persisted transition per step, in order, never rewinding.
    assert_eq!(*store.steps.lock().unwrap(), vec![1, 2, 3, 4]);
}

// ============================================================
// Terminal no-op and lookup failures
// ============================================================

#[tokio::test]
async fn run_on_terminal_operation_is_a_noop() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(3));

    let mut op = pending_op("op-1");
    op.step = 4;
    op.state = OperationState::Completed;
    store.seed(op.clone());

    let p = processor(store.clone(), client.clone());
    p.run("op-1").await.expect("terminal run should succeed");

    let after = store.get("op-1").await.unwrap();
    assert_eq!(after.step, op.step);
    assert_eq!(after.state, op.state);
    assert_eq!(after.updated_at, op.updated_at);

    // No collaborator traffic at all.
    assert!(client.calls().is_empty());
}

#[tokio::test]
async fn run_on_missing_operation_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let p = processor(store, Arc::new(MockUserClient::new()));

    let err = p.run("ghost").await.unwrap_err();
    assert!(matches!(err, EngineError::OperationNotFound(id) if id == "ghost"));
}

#[tokio::test]
async fn unknown_step_ordinal_is_fatal_and_leaves_record_untouched() {
    let store = Arc::new(MemoryStore::new());

    let mut op = pending_op("op-1");
    op.step = 99;
    op.state = OperationState::Running;
    store.seed(op);

    let p = processor(store.clone(), Arc::new(MockUserClient::new()));
    let err = p.run("op-1").await.unwrap_err();
    assert!(matches!(err, EngineError::UnknownStep { step: 99, .. }));

    // No handler ran, so nothing was persisted.
    let after = store.get("op-1").await.unwrap();
    assert_eq!(after.step, 99);
    assert_eq!(after.state, OperationState::Running);
}

// ============================================================
// Handler failures
// ============================================================

#[tokio::test]
async fn list_failure_marks_operation_failed() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::new().failing_list("user service down"));
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client);
    let err = p.run("op-1").await.unwrap_err();
    assert!(matches!(err, EngineError::Step { step: "LIST_USERS", .. }));

    // INITIAL advanced the pointer to LIST_USERS; the failure leaves it there.
    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Failed);
    assert_eq!(op.step, 1);
}

#[tokio::test]
async fn create_failure_leaves_step_at_create_users() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(1).failing_create("quota exceeded"));
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client.clone());
    let err = p.run("op-1").await.unwrap_err();
    assert!(matches!(err, EngineError::Step { step: "CREATE_USERS", .. }));

    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Failed);
    assert_eq!(op.step, 3);

    // The first create already failed; the batch was not advanced past it.
    assert_eq!(client.create_calls(), 1);
}

#[tokio::test]
async fn delete_failure_other_than_not_found_aborts_the_step() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(2).failing_delete("permission denied"));
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client);
    let err = p.run("op-1").await.unwrap_err();
    assert!(matches!(err, EngineError::Step { step: "DELETE_USERS", .. }));

    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Failed);
    assert_eq!(op.step, 2);
}

/// Client whose listed users are always already gone by delete time.
struct StaleListClient {
    deletes: AtomicUsize,
    creates: AtomicUsize,
}

#[async_trait]
impl UserClient for StaleListClient {
    async fn list_users(&self, _page: u32, _limit: u32) -> Result<Vec<User>, ClientError> {
        Ok(vec![
            User { id: "gone-1".into(), name: "Gone".into(), email: "gone1@example.com".into(), age: 50 },
            User { id: "gone-2".into(), name: "Gone".into(), email: "gone2@example.com".into(), age: 51 },
        ])
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.creates.fetch_add(1, Ordering::SeqCst);
        Ok(User {
            id: format!("user-{}", self.creates.load(Ordering::SeqCst)),
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        })
    }

    async fn delete_user(&self, _id: &str) -> Result<(), ClientError> {
        self.deletes.fetch_add(1, Ordering::SeqCst);
        Err(ClientError::NotFound)
    }
}

#[tokio::test]
async fn already_deleted_users_do_not_fail_the_delete_step() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(StaleListClient {
        deletes: AtomicUsize::new(0),
        creates: AtomicUsize::new(0),
    });
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client.clone());
    p.run("op-1").await.expect("NotFound deletes are tolerated");

    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Completed);
    assert_eq!(client.deletes.load(Ordering::SeqCst), 2);
    assert_eq!(client.creates.load(Ordering::SeqCst), 5);
}

// ============================================================
// Concurrency: at-most-one-runner
// ============================================================

#[tokio::test]
async fn concurrent_runs_never_double_apply_the_create_batch() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(3));
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client.clone());

    // Simulates a scanner tick racing the start request's own invocation.
    let a = tokio::spawn({
        let p = p.clone();
        async move { p.run("op-1").await }
    });
    let b = tokio::spawn({
        let p = p.clone();
        async move { p.run("op-1").await }
    });

    a.await.unwrap().expect("first runner succeeds");
    b.await.unwrap().expect("second runner is a no-op");

    // The second invocation observed the terminal state and did nothing.
    assert_eq!(client.create_calls(), 5);
    assert_eq!(client.current_users().len(), 5);
}

#[tokio::test]
async fn try_run_skips_when_lease_is_held() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::new());
    store.seed(pending_op("op-1"));

    let p = processor(store.clone(), client);

    // Hold the lease out-of-band, then ask for a scan-style run.
    let lease = p.locks.handle("op-1");
    let _guard = lease.lock().await;

    let ran = p.try_run("op-1").await.unwrap();
    assert!(!ran);

    let op = store.get("op-1").await.unwrap();
    assert_eq!(op.state, OperationState::Pending);
}

// ============================================================
// Transition bound
// ============================================================

struct NoopStep;

#[async_trait]
impl StepHandler for NoopStep {
    async fn run(&self, _op: &Operation, _users: &dyn UserClient) -> Result<(), ClientError> {
        Ok(())
    }
}

#[tokio::test]
async fn overlong_sequence_hits_the_transition_bound() {
    let mut slots: Vec<StepSlot> = (0..40)
        .map(|_| StepSlot {
            name: "NOOP",
            handler: Some(Arc::new(NoopStep) as Arc<dyn StepHandler>),
        })
        .collect();
    slots.push(StepSlot {
        name: "COMPLETED",
        handler: None,
    });

    let store = Arc::new(MemoryStore::new());
    store.seed(pending_op("op-1"));

    let p = OperationProcessor::new(
        store,
        Arc::new(MockUserClient::new()),
        StepSequence::from_slots(slots),
    );

    let err = p.run("op-1").await.unwrap_err();
    assert!(matches!(err, EngineError::TransitionLimit { .. }));
}

// ============================================================
// Recovery scanner
// ============================================================

#[tokio::test]
async fn scan_resumes_unfinished_operations() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(MockUserClient::seeded(1));

    store.seed(pending_op("op-a"));
    let mut midway = pending_op("op-b");
    midway.step = 3;
    midway.state = OperationState::Running;
    store.seed(midway);

    let mut done = pending_op("op-c");
    done.step = 4;
    done.state = OperationState::Completed;
    store.seed(done);

    let p = processor(store.clone(), client.clone());
    let scanner = RecoveryScanner::new(store.clone(), p, Duration::from_secs(5));
    scanner.scan_once().await;

    assert_eq!(
        store.get("op-a").await.unwrap().state,
        OperationState::Completed
    );
    assert_eq!(
        store.get("op-b").await.unwrap().state,
        OperationState::Completed
    );

    // The already-completed record triggered no collaborator traffic of its
    // own: op-a ran the full sequence, op-b only CREATE_USERS.
    assert_eq!(client.create_calls(), 10);
}

#[tokio::test]
async fn scanner_stops_on_shutdown_signal() {
    let store = Arc::new(MemoryStore::new());
    let p = processor(store.clone(), Arc::new(MockUserClient::new()));
    let scanner = RecoveryScanner::new(store, p, Duration::from_secs(3600));

    let (tx, rx) = tokio::sync::watch::channel(false);
    let task = tokio::spawn(scanner.run(rx));

    tx.send(true).unwrap();
    tokio::time::timeout(Duration::from_secs(1), task)
        .await
        .expect("scanner should exit promptly")
        .unwrap();
}
