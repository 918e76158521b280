use axum::{
    extract::State,
    http::StatusCode,
    routing::{delete, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::{
    auth::{
        dto::PublicUser,
        handlers::is_valid_email,
        jwt::AuthUser,
        password::hash_password,
        repo::User,
    },
    error::{is_unique_violation, ApiError},
    state::AppState,
};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateUserRequest {
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users/me", put(update_me))
        .route("/users/me", delete(delete_me))
}

#[instrument(skip(state, payload))]
pub async fn update_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    let current = User::find_by_id(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::unauthorized("User not found"))?;

    let email = match payload.email {
        Some(email) => {
            let email = email.trim().to_string();
            if !is_valid_email(&email) {
                return Err(ApiError::validation("Invalid email"));
            }
            email
        }
        None => current.email.clone(),
    };

    let username = match payload.username {
        Some(username) => {
            let username = username.trim().to_string();
            if username.is_empty() {
                return Err(ApiError::validation("Username must not be empty"));
            }
            username
        }
        None => current.username.clone(),
    };

    // Password is re-hashed only when the caller supplies a new one
    let password_hash = match payload.password {
        Some(password) => {
            if password.len() < 8 {
                return Err(ApiError::validation("Password too short"));
            }
            hash_password(&password)?
        }
        None => current.password_hash.clone(),
    };

    let user = match User::update(&state.db, user_id, &email, &username, &password_hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(%user_id, "email change collided with an existing account");
            return Err(ApiError::conflict("Email already registered"));
        }
        Err(e) => return Err(ApiError::Internal(e.into())),
    };

    info!(%user_id, "profile updated");
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn delete_me(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<StatusCode, ApiError> {
    let deleted = User::delete(&state.db, user_id).await?;
    if !deleted {
        return Err(ApiError::not_found("User not found"));
    }
    info!(%user_id, "account deleted");
    Ok(StatusCode::OK)
}
