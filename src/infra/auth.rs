//! Auth REST adapter for administrator sessions.

use async_trait::async_trait;
use reqwest::{Method, Response};
use serde::Deserialize;
use serde_json::json;

use crate::application::admin::session::{AuthError, AuthProvider, AuthSession};

use super::backend::{BackendClient, BackendError, error_message};

#[derive(Clone, Debug)]
pub struct RestAuthProvider {
    backend: BackendClient,
}

impl RestAuthProvider {
    pub fn new(backend: BackendClient) -> Self {
        Self { backend }
    }

    async fn post(
        &self,
        segments: &[&str],
        query: Option<(&str, &str)>,
        bearer: Option<&str>,
        body: serde_json::Value,
    ) -> Result<Response, AuthError> {
        let mut url = self.backend.endpoint(segments).map_err(transport)?;
        if let Some((key, value)) = query {
            url.query_pairs_mut().append_pair(key, value);
        }

        self.backend
            .request(Method::POST, url, bearer)
            .json(&body)
            .send()
            .await
            .map_err(|err| transport(BackendError::from(err)))
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
    email: Option<String>,
}

#[async_trait]
impl AuthProvider for RestAuthProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let response = self
            .post(
                &["auth", "v1", "token"],
                Some(("grant_type", "password")),
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;

        let status = response.status();
        if status.as_u16() == 400 {
            return Err(AuthError::InvalidCredentials);
        }
        if !status.is_success() {
            let (status, message) = error_message(response).await;
            return Err(AuthError::Rejected { status, message });
        }

        let token: TokenResponse = response.json().await.map_err(|err| AuthError::Decode {
            message: err.to_string(),
        })?;
        Ok(AuthSession {
            access_token: token.access_token,
            refresh_token: token.refresh_token,
            user_id: token.user.id,
            email: token.user.email,
            expires_in: token.expires_in,
        })
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError> {
        let response = self
            .post(
                &["auth", "v1", "signup"],
                None,
                None,
                json!({ "email": email, "password": password }),
            )
            .await?;
        ensure_success(response).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .post(&["auth", "v1", "logout"], None, Some(access_token), json!({}))
            .await?;
        ensure_success(response).await
    }

    async fn claim_admin(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .post(
                &["functions", "v1", "make-admin"],
                None,
                Some(access_token),
                json!({}),
            )
            .await?;
        ensure_success(response).await
    }
}

async fn ensure_success(response: Response) -> Result<(), AuthError> {
    if response.status().is_success() {
        return Ok(());
    }
    let (status, message) = error_message(response).await;
    Err(AuthError::Rejected { status, message })
}

fn transport(err: BackendError) -> AuthError {
    AuthError::Transport {
        message: err.to_string(),
    }
}
