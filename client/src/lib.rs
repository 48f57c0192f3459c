//! # Finance Client
//!
//! Client library for the personal finance API. It keeps the signed-in user's
//! goals, categories and transactions in memory and performs every change
//! through the REST API.
//!
//! ## Key Responsibilities
//!
//! - **Providers**: one data provider per entity, each the single source of
//!   truth for its list (see [`providers`])
//! - **Transport**: authenticated JSON and multipart requests over `reqwest`
//! - **Notifications**: every outcome is reported as a short-lived toast
//! - **Configuration**: API and uploads base URLs from the environment
//!
//! ## Wiring
//!
//! [`FinanceClient::new`] builds the whole stack from a [`ClientConfig`], an
//! [`AuthContext`] and a [`Notifier`]. The providers share one `ApiClient`, so
//! signing in or out through the auth context affects all of them at once.

pub mod auth;
pub mod config;
pub mod error;
pub mod forms;
pub mod notifications;
pub mod providers;
pub mod services;

#[cfg(test)]
mod test_utils;

use std::sync::Arc;

pub use auth::{AuthContext, Session};
pub use config::ClientConfig;
pub use error::{ApiError, ProviderError};
pub use forms::{GoalDraft, GoalImage, GoalPatch};
pub use notifications::{LogNotifier, Notifier, Toast, ToastChannel, ToastKind};
pub use providers::{CategoryProvider, GoalProvider, TransactionProvider};
pub use services::api::ApiClient;

/// All providers wired to one API client
#[derive(Clone)]
pub struct FinanceClient {
    pub auth: AuthContext,
    pub goals: GoalProvider,
    pub categories: CategoryProvider,
    pub transactions: TransactionProvider,
}

impl FinanceClient {
    pub fn new(
        config: &ClientConfig,
        auth: AuthContext,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, ApiError> {
        let api = ApiClient::new(config, auth.clone())?;
        Ok(Self::with_api(api, config.uploads_url(), notifier))
    }

    /// Build the providers on top of an existing client
    pub fn with_api(api: ApiClient, uploads_url: &str, notifier: Arc<dyn Notifier>) -> Self {
        let categories = CategoryProvider::new(api.clone(), notifier.clone());
        let goals = GoalProvider::new(api.clone(), categories.clone(), notifier.clone(), uploads_url);
        let transactions = TransactionProvider::new(api.clone(), notifier);

        Self {
            auth: api.auth().clone(),
            goals,
            categories,
            transactions,
        }
    }
}
