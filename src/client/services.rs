use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::dto::{AuthResponse, LoginRequest, PublicUser, RegisterRequest},
    client::{error::ClientResult, http::ApiClient},
    goals::{
        dto::{CreateGoalRequest, UpdateGoalRequest, UpdateProgressRequest, UpdateStatusRequest},
        repo::{Goal, GoalStatus},
    },
};

/// Typed operations over the REST surface. Login and register persist the
/// returned token pair; logout clears it no matter what the server says.
impl ApiClient {
    pub async fn login(&self, email: &str, password: &str) -> ClientResult<PublicUser> {
        let response: AuthResponse = self
            .post(
                "/auth/login",
                &LoginRequest {
                    email: email.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.set_tokens(&response.access_token, &response.refresh_token);
        Ok(response.user)
    }

    pub async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> ClientResult<PublicUser> {
        let response: AuthResponse = self
            .post(
                "/auth/register",
                &RegisterRequest {
                    email: email.to_string(),
                    username: username.to_string(),
                    password: password.to_string(),
                },
            )
            .await?;
        self.set_tokens(&response.access_token, &response.refresh_token);
        Ok(response.user)
    }

    /// Best-effort server call; local tokens are dropped either way.
    pub async fn logout(&self) {
        if let Err(e) = self.post_empty("/auth/logout").await {
            warn!(error = %e, "logout request failed");
        }
        self.clear_tokens();
    }

    pub async fn profile(&self) -> ClientResult<PublicUser> {
        self.get("/auth/profile").await
    }

    // --- goals ---

    pub async fn list_goals(&self) -> ClientResult<Vec<Goal>> {
        self.get("/goals").await
    }

    pub async fn goals_by_category(&self, category: &str) -> ClientResult<Vec<Goal>> {
        self.get(&format!("/goals/category/{category}")).await
    }

    pub async fn goal_categories(&self) -> ClientResult<Vec<String>> {
        self.get("/goals/metadata/categories").await
    }

    pub async fn goal_statuses(&self) -> ClientResult<Vec<String>> {
        self.get("/goals/metadata/statuses").await
    }

    pub async fn get_goal(&self, id: Uuid) -> ClientResult<Goal> {
        self.get(&format!("/goals/{id}")).await
    }

    pub async fn create_goal(&self, goal: &CreateGoalRequest) -> ClientResult<Goal> {
        self.post("/goals", goal).await
    }

    pub async fn update_goal(&self, id: Uuid, update: &UpdateGoalRequest) -> ClientResult<Goal> {
        self.put(&format!("/goals/{id}"), update).await
    }

    pub async fn update_goal_status(&self, id: Uuid, status: GoalStatus) -> ClientResult<Goal> {
        self.put(
            &format!("/goals/{id}/status"),
            &UpdateStatusRequest { status },
        )
        .await
    }

    pub async fn update_goal_progress(&self, id: Uuid, progress: i32) -> ClientResult<Goal> {
        self.patch(
            &format!("/goals/{id}/progress"),
            &UpdateProgressRequest { progress },
        )
        .await
    }

    pub async fn delete_goal(&self, id: Uuid) -> ClientResult<()> {
        self.delete(&format!("/goals/{id}")).await
    }
}
