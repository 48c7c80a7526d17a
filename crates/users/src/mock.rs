//! `MockUserClient` — a recording test double for [`UserClient`].
//!
//! Useful in unit and integration tests where the real user service is
//! either unavailable or irrelevant.  Every capability call is recorded so
//! tests can assert exact call counts and arguments.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::models::{NewUser, User};
use crate::{ClientError, UserClient};

/// One recorded capability call, in call order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    List { page: u32, limit: u32 },
    Create { email: String },
    Delete { id: String },
}

/// A mock client that serves a configurable in-memory user set and can be
/// told to fail any single capability.
#[derive(Default)]
pub struct MockUserClient {
    users: Mutex<Vec<User>>,
    calls: Mutex<Vec<Call>>,
    next_id: AtomicUsize,
    fail_list: Option<String>,
    fail_create: Option<String>,
    fail_delete: Option<String>,
}

impl MockUserClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populate the user set served by `list_users`.
    pub fn with_users(users: Vec<User>) -> Self {
        Self {
            users: Mutex::new(users),
            ..Self::default()
        }
    }

    /// Make every `list_users` call fail with an API error.
    pub fn failing_list(mut self, message: impl Into<String>) -> Self {
        self.fail_list = Some(message.into());
        self
    }

    /// Make every `create_user` call fail with an API error.
    pub fn failing_create(mut self, message: impl Into<String>) -> Self {
        self.fail_create = Some(message.into());
        self
    }

    /// Make every `delete_user` call fail with an API error.
    pub fn failing_delete(mut self, message: impl Into<String>) -> Self {
        self.fail_delete = Some(message.into());
        self
    }

    /// Convenience fixture: `count` users with sequential ids.
    pub fn seeded(count: usize) -> Self {
        let users = (1..=count)
            .map(|n| User {
                id: format!("existing-{n}"),
                name: format!("Existing {n}"),
                email: format!("existing{n}@example.com"),
                age: 20 + n as i32,
            })
            .collect();
        Self::with_users(users)
    }

    /// All recorded calls, in order.
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn list_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::List { .. }))
    }

    pub fn create_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Create { .. }))
    }

    pub fn delete_calls(&self) -> usize {
        self.count(|c| matches!(c, Call::Delete { .. }))
    }

    /// Users currently held by the mock service.
    pub fn current_users(&self) -> Vec<User> {
        self.users.lock().unwrap().clone()
    }

    fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| pred(c)).count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn api_error(message: &str) -> ClientError {
        ClientError::Api {
            status: 500,
            message: message.to_owned(),
        }
    }
}

#[async_trait]
impl UserClient for MockUserClient {
    async fn list_users(&self, page: u32, limit: u32) -> Result<Vec<User>, ClientError> {
        self.record(Call::List { page, limit });
        if let Some(msg) = &self.fail_list {
            return Err(Self::api_error(msg));
        }
        let users = self.users.lock().unwrap();
        Ok(users.iter().take(limit as usize).cloned().collect())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        self.record(Call::Create {
            email: user.email.clone(),
        });
        if let Some(msg) = &self.fail_create {
            return Err(Self::api_error(msg));
        }
        let n = self.next_id.fetch_add(1, Ordering::SeqCst);
        let created = User {
            id: format!("user-{n}"),
            name: user.name.clone(),
            email: user.email.clone(),
            age: user.age,
        };
        self.users.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        self.record(Call::Delete { id: id.to_owned() });
        if let Some(msg) = &self.fail_delete {
            return Err(Self::api_error(msg));
        }
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(ClientError::NotFound);
        }
        Ok(())
    }
}
