//! User-client error type.

use thiserror::Error;

/// Errors returned by a [`crate::UserClient`] capability call.
///
/// The engine inspects `NotFound` in exactly one place: a delete of an
/// already-deleted user is treated as success.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The referenced user does not exist on the collaborator side.
    #[error("user not found")]
    NotFound,

    /// The collaborator answered with a non-success status.
    #[error("user service error (status {status}): {message}")]
    Api { status: u16, message: String },

    /// Connection or protocol failure before any answer arrived.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
