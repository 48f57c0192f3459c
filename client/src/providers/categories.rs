//! Category data provider.
//!
//! Owns the user's category list. Besides the user-facing operations it
//! exposes a few silent, crate-internal calls the goal provider uses to keep
//! the "goals" category in step with the goals list; those report failures
//! back to the caller instead of raising their own toasts.

use std::sync::Arc;

use shared::{Category, NewCategoryRequest, ValidationError, GOALS_CATEGORY_NAME};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::error::{ApiError, ProviderError};
use crate::notifications::{Notifier, Toast};
use crate::providers::failure_message;
use crate::services::api::ApiClient;

#[derive(Debug, Default)]
struct CategoryState {
    categories: Vec<Category>,
    /// Whether the list has been fetched at least once
    loaded: bool,
}

#[derive(Clone)]
pub struct CategoryProvider {
    api: ApiClient,
    notifier: Arc<dyn Notifier>,
    state: Arc<RwLock<CategoryState>>,
}

impl CategoryProvider {
    pub fn new(api: ApiClient, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            api,
            notifier,
            state: Arc::new(RwLock::new(CategoryState::default())),
        }
    }

    /// Snapshot of the cached categories
    pub async fn categories(&self) -> Vec<Category> {
        self.state.read().await.categories.clone()
    }

    /// Reload categories from the server
    pub async fn fetch_categories(&self) -> Result<Vec<Category>, ProviderError> {
        self.load_remote().await.map_err(|e| {
            warn!("Failed to fetch categories: {}", e);
            self.notifier
                .notify(Toast::short_error(format!("Error fetching categories: {}", e)));
            ProviderError::from(e)
        })
    }

    /// Create a category and refresh the list
    pub async fn add_category(&self, name: &str, max_amount: Option<f64>) -> Result<(), ProviderError> {
        info!("Adding category '{}'", name);

        let result = self.try_add(name, max_amount).await;
        match &result {
            Ok(()) => {
                self.notifier.notify(Toast::short_success("Category added successfully"));
                let _ = self.fetch_categories().await;
            }
            Err(e) => {
                warn!("Failed to add category '{}': {}", name, e);
                self.notifier.notify(Toast::short_error(failure_message(e, |body| {
                    format!("Failed to add category: {}", body)
                })));
            }
        }
        result
    }

    async fn try_add(&self, name: &str, max_amount: Option<f64>) -> Result<(), ProviderError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ProviderError::Invalid(vec![ValidationError::EmptyName]));
        }
        if max_amount.is_some_and(|max| max < 0.0) {
            return Err(ProviderError::Invalid(vec![ValidationError::NegativeAmount]));
        }

        let user_id = self.api.auth().user_id().await?;
        let request = NewCategoryRequest {
            user_id,
            category_name: name.to_string(),
            max_amount,
        };
        self.api
            .post_json("/categories/add", &request)
            .await?
            .ensure_success()?;
        Ok(())
    }

    /// Delete a category, drop it locally and refresh the list
    pub async fn delete_category(&self, category: &Category) -> Result<(), ProviderError> {
        info!("Deleting category {} ('{}')", category.id, category.category_name);

        match self.remove_remote(category.id).await {
            Ok(()) => {
                self.notifier.notify(Toast::short_success("Successfully deleted"));
                let _ = self.fetch_categories().await;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete category {}: {}", category.id, e);
                let error = ProviderError::from(e);
                self.notifier
                    .notify(Toast::short_error(failure_message(&error, |_| "Failed to delete".to_string())));
                Err(error)
            }
        }
    }

    /// Find a category by exact name, loading the list first if it never was
    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>, ApiError> {
        let loaded = self.state.read().await.loaded;
        if !loaded {
            self.load_remote().await?;
        }

        Ok(self
            .state
            .read()
            .await
            .categories
            .iter()
            .find(|c| c.category_name == name)
            .cloned())
    }

    /// Fetch categories and replace the cache, without notifying
    pub(crate) async fn load_remote(&self) -> Result<Vec<Category>, ApiError> {
        let user_id = self.api.auth().user_id().await?;
        let categories: Vec<Category> = self
            .api
            .get("/categories/", &[("userId", user_id.as_str())])
            .await?
            .ensure_success()?
            .json()?;

        debug!("Loaded {} categories", categories.len());
        let mut state = self.state.write().await;
        state.categories = categories.clone();
        state.loaded = true;
        Ok(categories)
    }

    /// Create the "goals" category, then refresh the cache.
    ///
    /// A failed refresh is only logged, the category itself exists.
    pub(crate) async fn create_sentinel(&self, user_id: &str) -> Result<(), ApiError> {
        info!("Creating '{}' category", GOALS_CATEGORY_NAME);
        let request = NewCategoryRequest {
            user_id: user_id.to_string(),
            category_name: GOALS_CATEGORY_NAME.to_string(),
            max_amount: None,
        };
        self.api
            .post_json("/categories/add", &request)
            .await?
            .ensure_success()?;

        if let Err(e) = self.load_remote().await {
            warn!("Category refresh after creating '{}' failed: {}", GOALS_CATEGORY_NAME, e);
        }
        Ok(())
    }

    /// Delete a category by id and drop it from the cache, without notifying
    pub(crate) async fn remove_remote(&self, id: i64) -> Result<(), ApiError> {
        self.api
            .delete(&format!("/categories/delete/{}", id))
            .await?
            .ensure_success()?;

        self.state.write().await.categories.retain(|c| c.id != id);
        Ok(())
    }
}
