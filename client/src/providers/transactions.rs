//! Transaction data provider.
//!
//! Form input is validated locally before anything is sent; rejected input
//! never reaches the server.

use std::sync::Arc;

use shared::{Transaction, TransactionForm};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ProviderError};
use crate::notifications::{Notifier, Toast};
use crate::providers::failure_message;
use crate::services::api::ApiClient;

#[derive(Clone)]
pub struct TransactionProvider {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    transactions: Arc<RwLock<Vec<Transaction>>>,
}

impl TransactionProvider {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            transactions: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.transactions.read().await.clone()
    }

    pub async fn fetch_transactions(&self) -> Result<Vec<Transaction>, ProviderError> {
        match self.load_remote().await {
            Ok(transactions) => {
                *self.transactions.write().await = transactions.clone();
                Ok(transactions)
            }
            Err(e) => {
                warn!("Failed to fetch transactions: {}", e);
                self.notifier
                    .notify(Toast::short_error(format!("Error fetching transactions: {}", e)));
                Err(e.into())
            }
        }
    }

    async fn load_remote(&self) -> Result<Vec<Transaction>, ApiError> {
        let user_id = self.api.auth().user_id().await?;
        let transactions: Vec<Transaction> = self
            .api
            .get("/transactions/", &[("userId", user_id.as_str())])
            .await?
            .ensure_success()?
            .json()?;
        debug!("Loaded {} transactions", transactions.len());
        Ok(transactions)
    }

    /// Validate and create a transaction
    pub async fn add_transaction(&self, form: TransactionForm) -> Result<(), ProviderError> {
        info!("Adding transaction '{}'", form.transaction_name);

        match self.try_add(&form).await {
            Ok(()) => {
                let _ = self.fetch_transactions().await;
                self.notifier
                    .notify(Toast::short_success("Transaction added successfully"));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to add transaction: {}", e);
                self.notifier.notify(Toast::short_error(failure_message(&e, |body| {
                    format!("Failed to add transaction: {}", body)
                })));
                Err(e)
            }
        }
    }

    async fn try_add(&self, form: &TransactionForm) -> Result<(), ProviderError> {
        let user_id = self.api.auth().user_id().await?;
        let request = form.to_request(&user_id).map_err(ProviderError::Invalid)?;

        let response = self
            .api
            .post_json("/transactions/add", &request)
            .await?
            .ensure_success()?;

        match response.status {
            200 | 201 => Ok(()),
            status => Err(ProviderError::UnexpectedStatus {
                status,
                body: response.body,
            }),
        }
    }

    /// Replace an existing transaction's fields with the form's, keeping its id
    pub async fn edit_transaction(
        &self,
        existing: &Transaction,
        form: TransactionForm,
    ) -> Result<(), ProviderError> {
        match self.try_edit(existing, &form).await {
            Ok(()) => {
                let _ = self.fetch_transactions().await;
                self.notifier
                    .notify(Toast::short_success("Transaction edited successfully"));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to edit transaction {:?}: {}", existing.id, e);
                self.notifier.notify(Toast::short_error(failure_message(&e, |_| {
                    "Failed to edit transaction".to_string()
                })));
                Err(e)
            }
        }
    }

    async fn try_edit(&self, existing: &Transaction, form: &TransactionForm) -> Result<(), ProviderError> {
        let id = existing.id.ok_or(ProviderError::MissingId)?;
        let user_id = self.api.auth().user_id().await?;
        let request = form.to_request(&user_id).map_err(ProviderError::Invalid)?;
        info!("Editing transaction {}", id);

        let response = self
            .api
            .put_json(&format!("/transactions/edit/{}", id), &request)
            .await?
            .ensure_success()?;

        if response.status != 200 {
            return Err(ProviderError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }
        Ok(())
    }

    pub async fn delete_transaction(&self, transaction: &Transaction) -> Result<(), ProviderError> {
        match self.try_delete(transaction).await {
            Ok(id) => {
                self.transactions
                    .write()
                    .await
                    .retain(|t| t.id != Some(id));
                self.notifier.notify(Toast::short_success("Successfully deleted"));
                let _ = self.fetch_transactions().await;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete transaction {:?}: {}", transaction.id, e);
                self.notifier
                    .notify(Toast::short_error(failure_message(&e, |_| "Failed to delete".to_string())));
                Err(e)
            }
        }
    }

    async fn try_delete(&self, transaction: &Transaction) -> Result<i64, ProviderError> {
        let id = transaction.id.ok_or(ProviderError::MissingId)?;
        info!("Deleting transaction {}", id);

        self.api
            .delete(&format!("/transactions/delete/{}", id))
            .await?
            .ensure_success()?;
        Ok(id)
    }
}
