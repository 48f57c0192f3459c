//! Session state shared by every provider.
//!
//! All API calls are scoped to the signed-in user and carry a bearer token.

use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::info;

use crate::error::ApiError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
}

impl Session {
    pub fn new(user_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            token: token.into(),
        }
    }
}

/// Current user identity, cheap to clone
#[derive(Clone, Default)]
pub struct AuthContext {
    session: Arc<RwLock<Option<Session>>>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Context that is already signed in
    pub fn with_session(session: Session) -> Self {
        Self {
            session: Arc::new(RwLock::new(Some(session))),
        }
    }

    pub async fn sign_in(&self, session: Session) {
        info!("Signed in as user {}", session.user_id);
        *self.session.write().await = Some(session);
    }

    pub async fn sign_out(&self) {
        if let Some(session) = self.session.write().await.take() {
            info!("Signed out user {}", session.user_id);
        }
    }

    pub async fn session(&self) -> Option<Session> {
        self.session.read().await.clone()
    }

    pub async fn user_id(&self) -> Result<String, ApiError> {
        self.session
            .read()
            .await
            .as_ref()
            .map(|s| s.user_id.clone())
            .ok_or(ApiError::Unauthenticated)
    }

    /// Headers to attach to every API request
    pub async fn auth_headers(&self) -> Result<Vec<(String, String)>, ApiError> {
        let guard = self.session.read().await;
        let session = guard.as_ref().ok_or(ApiError::Unauthenticated)?;
        Ok(vec![(
            "Authorization".to_string(),
            format!("Bearer {}", session.token),
        )])
    }
}
