use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    error::ApiError,
    goals::{
        dto::{
            CreateGoalRequest, Pagination, UpdateGoalRequest, UpdateProgressRequest,
            UpdateStatusRequest,
        },
        repo::{Goal, GoalStatus},
    },
    state::AppState,
};

pub fn goal_routes() -> Router<AppState> {
    Router::new()
        .route("/goals", get(list_goals))
        .route("/goals", post(create_goal))
        .route("/goals/metadata/categories", get(list_categories))
        .route("/goals/metadata/statuses", get(list_statuses))
        .route("/goals/category/:category", get(list_goals_by_category))
        .route("/goals/:id", get(get_goal))
        .route("/goals/:id", put(update_goal))
        .route("/goals/:id", delete(delete_goal))
        .route("/goals/:id/status", put(update_status))
        .route("/goals/:id/progress", patch(update_progress))
}

fn check_progress(progress: i32) -> Result<(), ApiError> {
    if !(0..=100).contains(&progress) {
        return Err(ApiError::validation("Progress must be between 0 and 100"));
    }
    Ok(())
}

fn check_pagination(p: &Pagination) -> Result<(), ApiError> {
    if p.limit < 0 || p.offset < 0 {
        return Err(ApiError::validation("Limit and offset must not be negative"));
    }
    Ok(())
}

#[instrument(skip(state))]
pub async fn list_goals(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    check_pagination(&p)?;
    let goals = Goal::list_by_user(&state.db, user_id, p.limit, p.offset).await?;
    Ok(Json(goals))
}

#[instrument(skip(state))]
pub async fn list_goals_by_category(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(category): Path<String>,
) -> Result<Json<Vec<Goal>>, ApiError> {
    let goals = Goal::list_by_category(&state.db, user_id, &category).await?;
    Ok(Json(goals))
}

#[instrument(skip(state))]
pub async fn list_categories(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<String>>, ApiError> {
    let categories = Goal::categories(&state.db, user_id).await?;
    Ok(Json(categories))
}

#[instrument]
pub async fn list_statuses(AuthUser(_user_id): AuthUser) -> Json<Vec<&'static str>> {
    Json(GoalStatus::ALL.iter().map(|s| s.as_str()).collect())
}

#[instrument(skip(state))]
pub async fn get_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Goal>, ApiError> {
    let goal = Goal::find_one(&state.db, id, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Goal not found"))?;
    Ok(Json(goal))
}

#[instrument(skip(state, payload))]
pub async fn create_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateGoalRequest>,
) -> Result<(StatusCode, Json<Goal>), ApiError> {
    let title = payload.title.trim();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }

    let goal = Goal::create(
        &state.db,
        user_id,
        title,
        payload.description.as_deref(),
        payload.category.as_deref(),
        payload.target_date,
    )
    .await?;

    info!(goal_id = %goal.id, %user_id, "goal created");
    Ok((StatusCode::CREATED, Json(goal)))
}

#[instrument(skip(state, payload))]
pub async fn update_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateGoalRequest>,
) -> Result<Json<Goal>, ApiError> {
    if let Some(title) = &payload.title {
        if title.trim().is_empty() {
            return Err(ApiError::validation("Title must not be empty"));
        }
    }
    if let Some(progress) = payload.progress {
        check_progress(progress)?;
    }

    let goal = Goal::update(
        &state.db,
        id,
        user_id,
        payload.title.as_deref().map(str::trim),
        payload.description.as_deref(),
        payload.category.as_deref(),
        payload.target_date,
        payload.status,
        payload.progress,
    )
    .await?
    .ok_or_else(|| ApiError::not_found("Goal not found"))?;

    Ok(Json(goal))
}

#[instrument(skip(state))]
pub async fn update_status(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<Goal>, ApiError> {
    let goal = Goal::update_status(&state.db, id, user_id, payload.status)
        .await?
        .ok_or_else(|| ApiError::not_found("Goal not found"))?;
    Ok(Json(goal))
}

#[instrument(skip(state))]
pub async fn update_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateProgressRequest>,
) -> Result<Json<Goal>, ApiError> {
    check_progress(payload.progress)?;
    let goal = Goal::update_progress(&state.db, id, user_id, payload.progress)
        .await?
        .ok_or_else(|| ApiError::not_found("Goal not found"))?;
    Ok(Json(goal))
}

#[instrument(skip(state))]
pub async fn delete_goal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let deleted = Goal::delete(&state.db, id, user_id).await?;
    if !deleted {
        return Err(ApiError::not_found("Goal not found"));
    }
    info!(goal_id = %id, %user_id, "goal deleted");
    Ok(StatusCode::OK)
}
