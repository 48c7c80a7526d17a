//! HTTP JSON implementation of [`UserClient`].

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::models::{ListUsersResponse, NewUser, User};
use crate::{ClientError, UserClient};

/// [`UserClient`] over the user service's REST API.
#[derive(Debug, Clone)]
pub struct HttpUserClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpUserClient {
    /// `base_url` is the service root, e.g. `http://user-service:8081`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self {
            base_url,
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v1{path}", self.base_url)
    }
}

/// Turn a non-success response into the matching [`ClientError`].
async fn error_from_response(response: reqwest::Response) -> ClientError {
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        return ClientError::NotFound;
    }
    let message = response.text().await.unwrap_or_default();
    ClientError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl UserClient for HttpUserClient {
    async fn list_users(&self, page: u32, limit: u32) -> Result<Vec<User>, ClientError> {
        let response = self
            .client
            .get(self.url("/users"))
            .query(&[("page", page), ("limit", limit)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let body: ListUsersResponse = response.json().await?;
        Ok(body.users)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, ClientError> {
        let response = self
            .client
            .post(self.url("/users"))
            .json(user)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(response.json().await?)
    }

    async fn delete_user(&self, id: &str) -> Result<(), ClientError> {
        let response = self
            .client
            .delete(self.url(&format!("/users/{id}")))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        Ok(())
    }
}
