//! The `StepHandler` trait and the built-in step handlers.
//!
//! A handler performs one unit of work against the user service and reports
//! success or failure; it never touches the store.  Advancing the step
//! pointer is the processor's job, so handlers stay pure with respect to
//! operation state.

use async_trait::async_trait;
use tracing::info;

use store::Operation;
use users::{ClientError, NewUser, UserClient};

/// Page size used when listing the working set.  High enough to cover the
/// expected record counts in one page.
pub const LIST_PAGE_LIMIT: u32 = 100;

/// The fixed batch created by [`CreateUsersStep`].
pub const SEED_USERS: [(&str, &str, i32); 5] = [
    ("User One", "user1@example.com", 25),
    ("User Two", "user2@example.com", 30),
    ("User Three", "user3@example.com", 35),
    ("User Four", "user4@example.com", 28),
    ("User Five", "user5@example.com", 32),
];

/// One named unit of work in the step sequence.
#[async_trait]
pub trait StepHandler: Send + Sync {
    async fn run(&self, op: &Operation, users: &dyn UserClient) -> Result<(), ClientError>;
}

// ---------------------------------------------------------------------------
// InitialStep
// ---------------------------------------------------------------------------

/// No external call; gives every operation a well-defined starting point
/// before any side effect.
pub struct InitialStep;

#[async_trait]
impl StepHandler for InitialStep {
    async fn run(&self, op: &Operation, _users: &dyn UserClient) -> Result<(), ClientError> {
        info!(operation = %op.id, "starting operation");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// ListUsersStep
// ---------------------------------------------------------------------------

/// Lists the existing user records to establish the working set.
pub struct ListUsersStep;

#[async_trait]
impl StepHandler for ListUsersStep {
    async fn run(&self, op: &Operation, users: &dyn UserClient) -> Result<(), ClientError> {
        let existing = users.list_users(1, LIST_PAGE_LIMIT).await?;
        info!(operation = %op.id, count = existing.len(), "listed existing users");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// DeleteUsersStep
// ---------------------------------------------------------------------------

/// Deletes every existing user record.
///
/// Re-lists first so a record created or removed since the previous step is
/// still accounted for.  An individual `NotFound` means the record is
/// already gone and is not a failure; any other delete error aborts the
/// whole step.
pub struct DeleteUsersStep;

#[async_trait]
impl StepHandler for DeleteUsersStep {
    async fn run(&self, op: &Operation, users: &dyn UserClient) -> Result<(), ClientError> {
        let existing = users.list_users(1, LIST_PAGE_LIMIT).await?;

        for user in &existing {
            match users.delete_user(&user.id).await {
                Ok(()) | Err(ClientError::NotFound) => {}
                Err(e) => return Err(e),
            }
        }

        info!(operation = %op.id, count = existing.len(), "deleted existing users");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// CreateUsersStep
// ---------------------------------------------------------------------------

/// Creates the fixed seed batch of user records.
///
/// Any single creation failure aborts the step; there is no per-item
/// progress bookkeeping, so a re-run attempts the full batch again.
pub struct CreateUsersStep;

#[async_trait]
impl StepHandler for CreateUsersStep {
    async fn run(&self, op: &Operation, users: &dyn UserClient) -> Result<(), ClientError> {
        for (name, email, age) in SEED_USERS {
            users
                .create_user(&NewUser {
                    name: name.to_owned(),
                    email: email.to_owned(),
                    age,
                })
                .await?;
        }

        info!(operation = %op.id, count = SEED_USERS.len(), "created new users");
        Ok(())
    }
}
