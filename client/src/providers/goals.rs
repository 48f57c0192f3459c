//! # Goal Data Provider
//!
//! Single source of truth for the signed-in user's savings goals.
//!
//! ## Key Responsibilities
//!
//! - **Goal CRUD**: list, create, edit and delete goals through the API
//! - **Goals category upkeep**: the server files goal contributions under a
//!   category named "goals"; it is created before the first goal and removed
//!   once a fetch comes back empty
//! - **Image URLs**: image references come back as upload-relative paths and
//!   are exposed as absolute URLs
//! - **Reporting**: one toast per outcome, plus a typed result for callers
//!
//! ## Consistency
//!
//! Every successful mutation is followed by a full re-fetch. Fetches are
//! numbered and a response is only applied if no newer one landed first, so a
//! slow request can never overwrite fresher data. Mutations run one at a time
//! per provider: a rapid double submit is processed sequentially, and the
//! second add sees the goal created by the first.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use shared::{Goal, GOALS_CATEGORY_NAME};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::error::{ApiError, ProviderError};
use crate::forms::goal_form::resolve_image_url;
use crate::forms::{GoalDraft, GoalPatch};
use crate::notifications::{Notifier, Toast};
use crate::providers::categories::CategoryProvider;
use crate::providers::failure_message;
use crate::services::api::ApiClient;

#[derive(Debug, Default)]
struct GoalState {
    goals: Vec<Goal>,
    /// Sequence number of the data currently held
    applied_seq: u64,
}

#[derive(Clone)]
pub struct GoalProvider {
    api: ApiClient,
    categories: CategoryProvider,
    notifier: Arc<dyn Notifier>,
    uploads_url: String,
    state: Arc<RwLock<GoalState>>,
    fetch_seq: Arc<AtomicU64>,
    mutation: Arc<Mutex<()>>,
}

impl GoalProvider {
    pub fn new(
        api: ApiClient,
        categories: CategoryProvider,
        notifier: Arc<dyn Notifier>,
        uploads_url: impl Into<String>,
    ) -> Self {
        Self {
            api,
            categories,
            notifier,
            uploads_url: uploads_url.into(),
            state: Arc::new(RwLock::new(GoalState::default())),
            fetch_seq: Arc::new(AtomicU64::new(0)),
            mutation: Arc::new(Mutex::new(())),
        }
    }

    /// Snapshot of the current goals
    pub async fn goals(&self) -> Vec<Goal> {
        self.state.read().await.goals.clone()
    }

    pub fn categories(&self) -> &CategoryProvider {
        &self.categories
    }

    /// Reload goals from the server.
    ///
    /// An empty result also removes a leftover "goals" category. On failure
    /// the current list is kept as is.
    pub async fn fetch_goals(&self) -> Result<Vec<Goal>, ProviderError> {
        let seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;

        let goals = match self.load_goals().await {
            Ok(goals) => goals,
            Err(e) => {
                warn!("Failed to fetch goals: {}", e);
                self.notifier.notify(Toast::short_error(format!(
                    "Error fetching goals or categories: {}",
                    e
                )));
                return Err(e.into());
            }
        };

        let mut state = self.state.write().await;
        if seq < state.applied_seq {
            debug!("Dropping goals fetch #{} (already at #{})", seq, state.applied_seq);
            return Ok(state.goals.clone());
        }
        state.applied_seq = seq;
        state.goals = goals;
        debug!("Applied goals fetch #{} with {} goals", seq, state.goals.len());
        Ok(state.goals.clone())
    }

    async fn load_goals(&self) -> Result<Vec<Goal>, ApiError> {
        let user_id = self.api.auth().user_id().await?;
        let goals: Vec<Goal> = self
            .api
            .get("/goals/", &[("userId", user_id.as_str())])
            .await?
            .ensure_success()?
            .json()?;

        if goals.is_empty() {
            self.remove_orphaned_goals_category().await?;
            return Ok(goals);
        }

        Ok(goals
            .into_iter()
            .map(|mut goal| {
                goal.goal_image = goal
                    .goal_image
                    .map(|path| resolve_image_url(&self.uploads_url, &path));
                goal
            })
            .collect())
    }

    /// Delete the "goals" category left behind once the last goal is gone
    async fn remove_orphaned_goals_category(&self) -> Result<(), ApiError> {
        let categories = self.categories.load_remote().await?;
        if let Some(orphan) = categories.iter().find(|c| c.is_goals_sentinel()) {
            info!("No goals left, removing '{}' category {}", GOALS_CATEGORY_NAME, orphan.id);
            self.categories.remove_remote(orphan.id).await?;
        }
        Ok(())
    }

    /// Create a goal, making sure the "goals" category exists first
    pub async fn add_goal(&self, draft: GoalDraft) -> Result<(), ProviderError> {
        let _guard = self.mutation.lock().await;
        info!("Adding goal '{}'", draft.goal_name);

        match self.try_add(draft).await {
            Ok(()) => {
                self.notifier.notify(Toast::short_success("Goal added successfully"));
                let _ = self.fetch_goals().await;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to add goal: {}", e);
                self.notifier.notify(Toast::short_error(failure_message(&e, |body| {
                    format!("Failed to add goal: {}", body)
                })));
                Err(e)
            }
        }
    }

    async fn try_add(&self, draft: GoalDraft) -> Result<(), ProviderError> {
        let user_id = self.api.auth().user_id().await?;

        let first_goal = self.state.read().await.goals.is_empty();
        if first_goal && self.categories.find_by_name(GOALS_CATEGORY_NAME).await?.is_none() {
            self.categories.create_sentinel(&user_id).await?;
        }

        let form = draft.into_form(&user_id, &self.uploads_url);
        let response = self
            .api
            .post_multipart("/goals/add", form)
            .await?
            .ensure_success()?;

        if response.status != 201 {
            return Err(ProviderError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }
        Ok(())
    }

    /// Delete a goal, drop it locally and refresh the list
    pub async fn delete_goal(&self, goal: &Goal) -> Result<(), ProviderError> {
        let _guard = self.mutation.lock().await;

        match self.try_delete(goal).await {
            Ok(id) => {
                {
                    let mut state = self.state.write().await;
                    state.goals.retain(|g| g.id != Some(id));
                    // Reserve a number so fetches started before the delete are dropped
                    state.applied_seq = self.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
                }
                self.notifier.notify(Toast::short_success("Successfully deleted"));
                let _ = self.fetch_goals().await;
                Ok(())
            }
            Err(e) => {
                warn!("Failed to delete goal {:?}: {}", goal.id, e);
                self.notifier
                    .notify(Toast::short_error(failure_message(&e, |_| "Failed to delete".to_string())));
                Err(e)
            }
        }
    }

    async fn try_delete(&self, goal: &Goal) -> Result<i64, ProviderError> {
        let id = goal.id.ok_or(ProviderError::MissingId)?;
        info!("Deleting goal {}", id);

        let response = self
            .api
            .delete(&format!("/goals/delete/{}", id))
            .await?
            .ensure_success()?;

        if response.status != 200 {
            return Err(ProviderError::UnexpectedStatus {
                status: response.status,
                body: response.body,
            });
        }
        Ok(id)
    }

    /// Apply a partial update; only the fields set on `patch` are sent
    pub async fn edit_goal(&self, patch: GoalPatch) -> Result<(), ProviderError> {
        let _guard = self.mutation.lock().await;

        match self.try_edit(patch).await {
            Ok(()) => {
                let _ = self.fetch_goals().await;
                self.notifier.notify(Toast::short_success("Goal edited successfully"));
                Ok(())
            }
            Err(e) => {
                warn!("Failed to edit goal: {}", e);
                self.notifier
                    .notify(Toast::short_error(failure_message(&e, |_| "Failed to edit goal".to_string())));
                Err(e)
            }
        }
    }

    async fn try_edit(&self, patch: GoalPatch) -> Result<(), ProviderError> {
        let id = patch.id.ok_or(ProviderError::MissingId)?;
        let user_id = self.api.auth().user_id().await?;
        info!("Editing goal {}", id);

        let form = patch.into_form(&user_id, &self.uploads_url);
        let response = self
            .api
            .put_multipart(&format!("/goals/edit/{}", id), form)
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
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthContext, Session};
    use crate::forms::GoalImage;
    use crate::services::api::Method;
    use crate::test_utils::{RecordingNotifier, ScriptedTransport};
    use serde_json::json;
    use tokio::sync::Notify;

    const UPLOADS: &str = "http://api.test/uploads";

    struct Harness {
        provider: GoalProvider,
        transport: Arc<ScriptedTransport>,
        notifier: Arc<RecordingNotifier>,
    }

    fn setup() -> Harness {
        setup_with_auth(AuthContext::with_session(Session::new("5", "tok")))
    }

    fn setup_with_auth(auth: AuthContext) -> Harness {
        let transport = Arc::new(ScriptedTransport::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let api = ApiClient::with_transport("http://api.test", auth, transport.clone());
        let categories = CategoryProvider::new(api.clone(), notifier.clone());
        let provider = GoalProvider::new(api, categories, notifier.clone(), UPLOADS);
        Harness { provider, transport, notifier }
    }

    fn goal_json(id: i64, name: &str) -> serde_json::Value {
        json!({
            "id": id,
            "goal_name": name,
            "goal_description": "",
            "goal_amount": 100,
            "amount_raised": 10,
            "goal_image": format!("{}.png", name),
            "goal_date": null
        })
    }

    async fn seed_goals(h: &Harness, goals: serde_json::Value) {
        h.transport.respond_json(Method::Get, "/goals/", 200, goals);
        h.provider.fetch_goals().await.unwrap();
    }

    fn ids(goals: &[Goal]) -> Vec<i64> {
        goals.iter().filter_map(|g| g.id).collect()
    }

    #[tokio::test]
    async fn test_fetch_resolves_image_urls() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "bike")])).await;

        let goals = h.provider.goals().await;
        assert_eq!(goals[0].goal_image.as_deref(), Some("http://api.test/uploads/bike.png"));
        assert_eq!(
            h.transport.last(Method::Get, "/goals/").unwrap().query_param("userId"),
            Some("5")
        );
        // Non-empty result never touches categories
        assert_eq!(h.transport.count(Method::Get, "/categories/"), 0);
    }

    #[tokio::test]
    async fn test_empty_fetch_deletes_goals_category_once() {
        let h = setup();
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([]));
        h.transport.respond_json(
            Method::Get,
            "/categories/",
            200,
            json!([{ "id": 4, "category_name": "Food" }, { "id": 9, "category_name": "goals" }]),
        );
        h.transport.respond(Method::Delete, "/categories/delete/9", 200, "");

        let goals = h.provider.fetch_goals().await.unwrap();

        assert!(goals.is_empty());
        assert_eq!(h.transport.count(Method::Delete, "/categories/delete/9"), 1);
        assert_eq!(h.transport.count(Method::Delete, "/categories/delete/4"), 0);
        assert!(h.notifier.toasts().is_empty());
        assert_eq!(ids_of_categories(&h).await, vec![4]);
    }

    async fn ids_of_categories(h: &Harness) -> Vec<i64> {
        h.provider.categories().categories().await.iter().map(|c| c.id).collect()
    }

    #[tokio::test]
    async fn test_empty_fetch_without_goals_category_deletes_nothing() {
        let h = setup();
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([]));
        h.transport.respond_json(Method::Get, "/categories/", 200, json!([{ "id": 4, "category_name": "Food" }]));

        h.provider.fetch_goals().await.unwrap();

        assert_eq!(h.transport.calls(), vec!["GET /goals/", "GET /categories/"]);
    }

    #[tokio::test]
    async fn test_fetch_failure_keeps_stale_list() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "bike"), goal_json(2, "car")])).await;
        h.transport.respond(Method::Get, "/goals/", 502, "bad gateway");

        let result = h.provider.fetch_goals().await;

        assert!(matches!(result, Err(ProviderError::Api(ApiError::Status { status: 502, .. }))));
        assert_eq!(ids(&h.provider.goals().await), vec![1, 2]);
        assert_eq!(h.notifier.errors().len(), 1);
        assert!(h.notifier.errors()[0].starts_with("Error fetching goals or categories: "));
    }

    #[tokio::test]
    async fn test_category_cleanup_failure_is_reported_and_keeps_list() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "bike")])).await;
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([]));
        h.transport.fail(Method::Get, "/categories/", ApiError::Transport("reset".to_string()));

        assert!(h.provider.fetch_goals().await.is_err());
        assert_eq!(ids(&h.provider.goals().await), vec![1]);
        assert_eq!(h.notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_first_goal_creates_category_before_goal() {
        let h = setup();
        h.transport.respond_json(Method::Get, "/categories/", 200, json!([]));
        h.transport.respond(Method::Post, "/categories/add", 201, "{}");
        h.transport.respond(Method::Post, "/goals/add", 201, "{}");
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([goal_json(1, "bike")]));

        h.provider.add_goal(GoalDraft::new("bike", 100.0)).await.unwrap();

        let calls = h.transport.calls();
        let category_post = calls.iter().position(|c| c == "POST /categories/add").unwrap();
        let goal_post = calls.iter().position(|c| c == "POST /goals/add").unwrap();
        assert!(category_post < goal_post);

        let body = h.transport.last(Method::Post, "/categories/add").unwrap();
        assert_eq!(
            body.json().unwrap(),
            &json!({ "user_id": "5", "category_name": "goals", "max_amount": null })
        );
        assert_eq!(h.notifier.successes(), vec!["Goal added successfully"]);
        assert_eq!(ids(&h.provider.goals().await), vec![1]);
    }

    #[tokio::test]
    async fn test_existing_goals_category_is_reused() {
        let h = setup();
        h.transport.respond_json(Method::Get, "/categories/", 200, json!([{ "id": 9, "category_name": "goals" }]));
        h.transport.respond(Method::Post, "/goals/add", 201, "{}");
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([goal_json(1, "bike")]));

        h.provider.add_goal(GoalDraft::new("bike", 100.0)).await.unwrap();

        assert_eq!(h.transport.count(Method::Post, "/categories/add"), 0);
    }

    #[tokio::test]
    async fn test_add_with_existing_goals_skips_category_check() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "bike")])).await;
        h.transport.respond(Method::Post, "/goals/add", 201, "{}");

        h.provider
            .add_goal(
                GoalDraft::new("trip", 800.0)
                    .image(GoalImage::upload("trip.png", "image/png", vec![1, 2])),
            )
            .await
            .unwrap();

        assert_eq!(h.transport.count(Method::Get, "/categories/"), 0);
        let sent = h.transport.last(Method::Post, "/goals/add").unwrap();
        let form = sent.multipart().unwrap();
        assert_eq!(form.text_value("user_id"), Some("5"));
        assert_eq!(form.text_value("goal_amount"), Some("800"));
        assert_eq!(form.file_value("goal_image").unwrap().file_name, "trip.png");
    }

    #[tokio::test]
    async fn test_add_non_2xx_leaves_list_and_notifies_once() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "bike")])).await;
        h.transport.respond(Method::Post, "/goals/add", 400, "goal_name required");

        let result = h.provider.add_goal(GoalDraft::default()).await;

        assert!(matches!(result, Err(ProviderError::Api(ApiError::Status { status: 400, .. }))));
        assert_eq!(ids(&h.provider.goals().await), vec![1]);
        assert_eq!(h.notifier.errors(), vec!["An error occurred: request failed with status code 400"]);
        assert!(h.notifier.successes().is_empty());
        assert_eq!(h.transport.count(Method::Get, "/goals/"), 1);
    }

    #[tokio::test]
    async fn test_add_unexpected_2xx_names_response() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "bike")])).await;
        h.transport.respond(Method::Post, "/goals/add", 200, "queued");

        let result = h.provider.add_goal(GoalDraft::new("car", 10.0)).await;

        assert!(matches!(result, Err(ProviderError::UnexpectedStatus { status: 200, .. })));
        assert_eq!(h.notifier.errors(), vec!["Failed to add goal: queued"]);
    }

    #[tokio::test]
    async fn test_add_aborts_when_category_creation_fails() {
        let h = setup();
        h.transport.respond_json(Method::Get, "/categories/", 200, json!([]));
        h.transport.respond(Method::Post, "/categories/add", 500, "");

        assert!(h.provider.add_goal(GoalDraft::new("bike", 100.0)).await.is_err());

        assert_eq!(h.transport.count(Method::Post, "/goals/add"), 0);
        assert_eq!(h.notifier.errors().len(), 1);
    }

    #[tokio::test]
    async fn test_add_without_session_sends_nothing() {
        let h = setup_with_auth(AuthContext::new());

        let result = h.provider.add_goal(GoalDraft::new("bike", 100.0)).await;

        assert_eq!(result, Err(ProviderError::Api(ApiError::Unauthenticated)));
        assert!(h.transport.requests().is_empty());
        assert_eq!(h.notifier.errors(), vec!["An error occurred: not signed in"]);
    }

    #[tokio::test]
    async fn test_concurrent_first_adds_create_one_category() {
        let h = setup();
        h.transport.respond_json(Method::Get, "/categories/", 200, json!([]));
        h.transport.respond(Method::Post, "/categories/add", 201, "{}");
        h.transport.respond(Method::Post, "/goals/add", 201, "{}");
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([goal_json(1, "bike")]));

        let (a, b) = tokio::join!(
            h.provider.add_goal(GoalDraft::new("bike", 100.0)),
            h.provider.add_goal(GoalDraft::new("bike", 100.0)),
        );
        a.unwrap();
        b.unwrap();

        assert_eq!(h.transport.count(Method::Post, "/categories/add"), 1);
        assert_eq!(h.transport.count(Method::Post, "/goals/add"), 2);
    }

    #[tokio::test]
    async fn test_delete_removes_only_matching_goal() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "a"), goal_json(2, "b"), goal_json(3, "c")])).await;
        h.transport.respond(Method::Delete, "/goals/delete/2", 200, "");
        // Re-fetch fails, so the list shows the local removal only
        h.transport.respond(Method::Get, "/goals/", 503, "");

        let target = h.provider.goals().await[1].clone();
        h.provider.delete_goal(&target).await.unwrap();

        assert_eq!(ids(&h.provider.goals().await), vec![1, 3]);
        assert_eq!(h.notifier.successes(), vec!["Successfully deleted"]);
    }

    #[tokio::test]
    async fn test_deleting_last_goal_cleans_up_category() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "a")])).await;
        h.transport.respond(Method::Delete, "/goals/delete/1", 200, "");
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([]));
        h.transport.respond_json(Method::Get, "/categories/", 200, json!([{ "id": 9, "category_name": "goals" }]));
        h.transport.respond(Method::Delete, "/categories/delete/9", 200, "");

        let target = h.provider.goals().await[0].clone();
        h.provider.delete_goal(&target).await.unwrap();

        assert!(h.provider.goals().await.is_empty());
        let calls = h.transport.calls();
        assert_eq!(
            &calls[1..],
            &[
                "DELETE /goals/delete/1",
                "GET /goals/",
                "GET /categories/",
                "DELETE /categories/delete/9"
            ][..]
        );
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_list_and_notifies_once() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "a"), goal_json(2, "b")])).await;
        h.transport.respond(Method::Delete, "/goals/delete/1", 404, "not found");

        let target = h.provider.goals().await[0].clone();
        assert!(h.provider.delete_goal(&target).await.is_err());

        assert_eq!(ids(&h.provider.goals().await), vec![1, 2]);
        assert_eq!(h.notifier.errors().len(), 1);
        assert!(h.notifier.successes().is_empty());
    }

    #[tokio::test]
    async fn test_delete_unexpected_2xx() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "a")])).await;
        h.transport.respond(Method::Delete, "/goals/delete/1", 204, "");

        let target = h.provider.goals().await[0].clone();
        assert!(h.provider.delete_goal(&target).await.is_err());
        assert_eq!(h.notifier.errors(), vec!["Failed to delete"]);
        assert_eq!(ids(&h.provider.goals().await), vec![1]);
    }

    #[tokio::test]
    async fn test_unsaved_goal_cannot_be_deleted_or_edited() {
        let h = setup();

        assert_eq!(h.provider.delete_goal(&Goal::default()).await, Err(ProviderError::MissingId));
        assert_eq!(
            h.provider.edit_goal(GoalPatch::default().name("x")).await,
            Err(ProviderError::MissingId)
        );
        assert!(h.transport.requests().is_empty());
        assert_eq!(h.notifier.errors().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_sends_only_set_fields() {
        let h = setup();
        seed_goals(&h, json!([goal_json(7, "bike")])).await;
        h.transport.respond(Method::Put, "/goals/edit/7", 200, "{}");

        h.provider.edit_goal(GoalPatch::new(7).name("road bike")).await.unwrap();

        let sent = h.transport.last(Method::Put, "/goals/edit/7").unwrap();
        let form = sent.multipart().unwrap();
        assert_eq!(form.field_names(), vec!["user_id", "goal_name"]);
        assert_eq!(form.text_value("goal_name"), Some("road bike"));
        assert_eq!(h.transport.count(Method::Get, "/goals/"), 2);
        assert_eq!(h.notifier.successes(), vec!["Goal edited successfully"]);
    }

    #[tokio::test]
    async fn test_edit_full_goal_sends_relative_image() {
        let h = setup();
        seed_goals(&h, json!([goal_json(7, "bike")])).await;
        h.transport.respond(Method::Put, "/goals/edit/7", 200, "{}");

        let goal = h.provider.goals().await[0].clone();
        h.provider.edit_goal(GoalPatch::from(&goal).raised(55.0)).await.unwrap();

        let sent = h.transport.last(Method::Put, "/goals/edit/7").unwrap();
        let form = sent.multipart().unwrap();
        assert_eq!(form.text_value("goal_image"), Some("bike.png"));
        assert_eq!(form.text_value("amount_raised"), Some("55"));
    }

    #[tokio::test]
    async fn test_edit_failure_leaves_list_and_notifies_once() {
        let h = setup();
        seed_goals(&h, json!([goal_json(7, "bike")])).await;
        h.transport.respond(Method::Put, "/goals/edit/7", 500, "");

        assert!(h.provider.edit_goal(GoalPatch::new(7).amount(1.0)).await.is_err());

        assert_eq!(h.provider.goals().await[0].goal_name, "bike");
        assert_eq!(h.notifier.errors().len(), 1);
        assert_eq!(h.transport.count(Method::Get, "/goals/"), 1);
    }

    #[tokio::test]
    async fn test_fetch_in_flight_during_delete_is_dropped() {
        let h = setup();
        seed_goals(&h, json!([goal_json(1, "a"), goal_json(2, "b")])).await;

        let gate = Arc::new(Notify::new());
        h.transport.respond_gated(
            Method::Get,
            "/goals/",
            200,
            &json!([goal_json(1, "a"), goal_json(2, "b")]).to_string(),
            gate.clone(),
        );
        // The delete's own re-fetch fails, leaving only the local removal
        h.transport.respond(Method::Get, "/goals/", 503, "");
        h.transport.respond(Method::Delete, "/goals/delete/1", 200, "");

        let in_flight = {
            let provider = h.provider.clone();
            tokio::spawn(async move { provider.fetch_goals().await })
        };
        while h.transport.count(Method::Get, "/goals/") < 2 {
            tokio::task::yield_now().await;
        }

        let target = h.provider.goals().await[0].clone();
        h.provider.delete_goal(&target).await.unwrap();
        assert_eq!(ids(&h.provider.goals().await), vec![2]);

        gate.notify_one();
        in_flight.await.unwrap().unwrap();

        assert_eq!(ids(&h.provider.goals().await), vec![2]);
    }

    #[tokio::test]
    async fn test_stale_fetch_does_not_overwrite_newer() {
        let h = setup();
        let gate = Arc::new(Notify::new());
        h.transport.respond_gated(
            Method::Get,
            "/goals/",
            200,
            &json!([goal_json(1, "old")]).to_string(),
            gate.clone(),
        );
        h.transport.respond_json(Method::Get, "/goals/", 200, json!([goal_json(2, "new")]));

        let slow = {
            let provider = h.provider.clone();
            tokio::spawn(async move { provider.fetch_goals().await })
        };
        while h.transport.count(Method::Get, "/goals/") == 0 {
            tokio::task::yield_now().await;
        }

        h.provider.fetch_goals().await.unwrap();
        gate.notify_one();
        slow.await.unwrap().unwrap();

        assert_eq!(ids(&h.provider.goals().await), vec![2]);
    }
}
