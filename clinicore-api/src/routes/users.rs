/// User account management endpoints
///
/// Admins create and manage any account (including staff roles); everyone
/// else may read and update only their own profile. Deactivation is a
/// soft-delete, never a hard DELETE.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ok, Envelope},
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use clinicore_shared::{
    auth::{
        authorization::{require, require_self_or, Capability},
        middleware::AuthContext,
        password,
    },
    events::{Effect, Outbox},
    models::user::{CreateUser, Role, UpdateUser, User},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Create user request (admin only; any role)
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,

    pub role: Role,
}

/// Update user request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateUserRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: Option<String>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListUsersQuery {
    pub role: Option<Role>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `POST /v1/users` - create an account with any role (admin only)
pub async fn create_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateUserRequest>,
) -> ApiResult<Json<Envelope<User>>> {
    require(&auth, Capability::ManageUsers)?;
    req.validate()?;

    let password_hash = password::hash_password(&req.password)?;

    let user = User::create(
        &state.db,
        CreateUser {
            name: req.name,
            email: req.email,
            password_hash,
            role: req.role,
        },
    )
    .await?;

    Outbox::enqueue_all(
        &state.db,
        &[Effect::audit(
            Some(auth.user_id),
            "user.created",
            "user",
            user.id,
            json!({ "role": user.role.as_str() }),
        )],
    )
    .await;

    Ok(ok("User created", user))
}

/// `GET /v1/users` - list accounts (admin only)
pub async fn list_users(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListUsersQuery>,
) -> ApiResult<Json<Envelope<Vec<User>>>> {
    require(&auth, Capability::ManageUsers)?;

    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let users = User::list(&state.db, query.role, limit, offset).await?;

    Ok(ok("Users", users))
}

/// `GET /v1/users/:id` - fetch one account (self, or admin)
pub async fn get_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<User>>> {
    require_self_or(&auth, id, Capability::ManageUsers)?;

    let user = User::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ok("User", user))
}

/// `PUT /v1/users/:id` - update profile (self, or admin)
pub async fn update_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateUserRequest>,
) -> ApiResult<Json<Envelope<User>>> {
    require_self_or(&auth, id, Capability::ManageUsers)?;
    req.validate()?;

    let password_hash = match req.password {
        Some(ref p) => Some(password::hash_password(p)?),
        None => None,
    };

    let user = User::update(
        &state.db,
        id,
        UpdateUser {
            name: req.name,
            email: req.email,
            password_hash,
            active: None,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(ok("User updated", user))
}

/// `POST /v1/users/:id/deactivate` - soft-delete an account (admin only)
pub async fn deactivate_user(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::ManageUsers)?;

    let removed = User::soft_delete(&state.db, id).await?;
    if !removed {
        return Err(ApiError::NotFound("User not found".to_string()));
    }

    Outbox::enqueue_all(
        &state.db,
        &[Effect::audit(
            Some(auth.user_id),
            "user.deactivated",
            "user",
            id,
            json!({}),
        )],
    )
    .await;

    Ok(ok("User deactivated", json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_user_request_validation() {
        let valid = CreateUserRequest {
            name: "Dr. Mira Voss".to_string(),
            email: "mira@clinic.example".to_string(),
            password: "longenough1".to_string(),
            role: Role::Doctor,
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateUserRequest {
            name: "".to_string(),
            email: "mira@clinic.example".to_string(),
            password: "longenough1".to_string(),
            role: Role::Doctor,
        };
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_update_user_request_optional_fields() {
        let empty = UpdateUserRequest::default();
        assert!(empty.validate().is_ok());

        let bad_email = UpdateUserRequest {
            email: Some("nope".to_string()),
            ..Default::default()
        };
        assert!(bad_email.validate().is_err());
    }
}
