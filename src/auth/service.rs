use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use crate::{
    auth::{
        dto::AuthResponse,
        jwt::JwtKeys,
        password::{hash_password, verify_password},
        repo::User,
    },
    error::{is_unique_violation, ApiError},
};

/// Look up the user by email and check the password. Unknown email and wrong
/// password both collapse to `None`; the caller maps either to the same
/// generic unauthorized error.
pub async fn validate_credentials(
    db: &PgPool,
    email: &str,
    password: &str,
) -> anyhow::Result<Option<User>> {
    let Some(user) = User::find_by_email(db, email).await? else {
        return Ok(None);
    };
    if verify_password(password, &user.password_hash)? {
        Ok(Some(user))
    } else {
        Ok(None)
    }
}

/// Sign an access/refresh pair for the user. Stateless; nothing is persisted.
pub fn issue_session(keys: &JwtKeys, user: User) -> anyhow::Result<AuthResponse> {
    let access_token = keys.sign_access(user.id, &user.email)?;
    let refresh_token = keys.sign_refresh(user.id, &user.email)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: user.into(),
    })
}

/// Create the user and issue their first session. The existence check and the
/// insert are not one transaction, so a concurrent duplicate registration can
/// slip past the check; the unique index catches it and it surfaces as the
/// same conflict.
pub async fn register(
    db: &PgPool,
    keys: &JwtKeys,
    email: &str,
    username: &str,
    password: &str,
) -> Result<AuthResponse, ApiError> {
    if User::find_by_email(db, email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(ApiError::conflict("Email already registered"));
    }

    let hash = hash_password(password)?;
    let user = match User::create(db, email, username, &hash).await {
        Ok(u) => u,
        Err(e) if is_unique_violation(&e) => {
            warn!(email = %email, "registration raced a duplicate insert");
            return Err(ApiError::conflict("Email already registered"));
        }
        Err(e) => return Err(ApiError::Internal(e.into())),
    };

    Ok(issue_session(keys, user)?)
}

/// Resolve a verified session subject back to its user. Absent user means the
/// token outlived the account; the handler maps this to unauthorized.
pub async fn resolve_session(db: &PgPool, subject: Uuid) -> anyhow::Result<Option<User>> {
    User::find_by_id(db, subject).await
}
