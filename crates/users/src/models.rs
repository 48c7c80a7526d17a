//! Wire models for the user-record service.

use serde::{Deserialize, Serialize};

/// A user record owned by the collaborator service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub age: i32,
}

/// Fields for creating a new user record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub age: i32,
}

/// Response envelope of the list capability.
#[derive(Debug, Deserialize)]
pub struct ListUsersResponse {
    pub users: Vec<User>,
}
