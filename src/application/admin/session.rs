//! Administrator sign-in state.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{rw_read, rw_write};

const MIN_PASSWORD_LEN: usize = 6;
const SOURCE: &str = "application::admin::session";

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,
    #[error("auth service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("auth request failed: {message}")]
    Transport { message: String },
    #[error("unexpected auth response: {message}")]
    Decode { message: String },
}

/// An authenticated backend session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    pub access_token: String,
    pub refresh_token: Option<String>,
    pub user_id: String,
    pub email: Option<String>,
    /// Seconds until `access_token` expires.
    pub expires_in: Option<u64>,
}

/// Hosted authentication service.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthError>;
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
    /// Grant the admin role to the session's user.
    async fn claim_admin(&self, access_token: &str) -> Result<(), AuthError>;
}

#[derive(Debug, Error)]
pub enum AdminSessionError {
    #[error("{0}")]
    Validation(&'static str),
    #[error("sign in required")]
    Unauthenticated,
    #[error(transparent)]
    Auth(#[from] AuthError),
}

#[derive(Clone)]
pub struct AdminSessionService {
    provider: Arc<dyn AuthProvider>,
    current: Arc<RwLock<Option<AuthSession>>>,
}

impl AdminSessionService {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            current: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AdminSessionError> {
        let email = validate_credentials(email, password)?;
        let session = self.provider.sign_in(&email, password).await?;
        *rw_write(&self.current, SOURCE, "sign_in") = Some(session.clone());
        info!(target = SOURCE, user_id = %session.user_id, "admin signed in");
        Ok(session)
    }

    /// Register, sign in, then request the admin role.
    ///
    /// A failed role claim leaves the user signed in without admin rights.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AdminSessionError> {
        let email = validate_credentials(email, password)?;
        self.provider.sign_up(&email, password).await?;
        let session = self.sign_in(&email, password).await?;

        if let Err(err) = self.provider.claim_admin(&session.access_token).await {
            warn!(
                target = SOURCE,
                user_id = %session.user_id,
                error = %err,
                result = "ignored",
                "failed to claim admin role"
            );
        }
        Ok(session)
    }

    /// Drop the local session even when the remote sign-out fails.
    pub async fn sign_out(&self) -> Result<(), AdminSessionError> {
        let Some(session) = rw_write(&self.current, SOURCE, "sign_out").take() else {
            return Ok(());
        };
        self.provider.sign_out(&session.access_token).await?;
        Ok(())
    }

    pub fn current_session(&self) -> Option<AuthSession> {
        rw_read(&self.current, SOURCE, "current_session").clone()
    }

    pub fn require_session(&self) -> Result<AuthSession, AdminSessionError> {
        self.current_session()
            .ok_or(AdminSessionError::Unauthenticated)
    }
}

fn validate_credentials(email: &str, password: &str) -> Result<String, AdminSessionError> {
    let email = email.trim();
    let well_formed = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'));
    if !well_formed {
        return Err(AdminSessionError::Validation(
            "Please enter a valid email address",
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AdminSessionError::Validation(
            "Password must be at least 6 characters",
        ));
    }
    Ok(email.to_string())
}
