//! `users` crate — the `UserClient` trait and its implementations.
//!
//! The user-record service is an external collaborator; this crate pins down
//! its capability set {List, Create, Delete} so the engine can be tested
//! against a recording mock and deployed against the HTTP client.

pub mod error;
pub mod http;
pub mod mock;
pub mod models;
pub mod traits;

pub use error::ClientError;
pub use http::HttpUserClient;
pub use mock::MockUserClient;
pub use models::{NewUser, User};
pub use traits::UserClient;
