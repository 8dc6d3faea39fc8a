/// Notification endpoints
///
/// Strictly per-user: everyone lists and acknowledges only their own rows.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    response::{ok, Envelope},
};
use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use clinicore_shared::{auth::middleware::AuthContext, models::notification::Notification};
use serde::Deserialize;
use uuid::Uuid;

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListNotificationsQuery {
    pub unread_only: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `GET /v1/notifications` - the caller's notifications, newest first
pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListNotificationsQuery>,
) -> ApiResult<Json<Envelope<Vec<Notification>>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let notifications = Notification::list_for_user(
        &state.db,
        auth.user_id,
        query.unread_only.unwrap_or(false),
        limit,
        offset,
    )
    .await?;

    Ok(ok("Notifications", notifications))
}

/// `PATCH /v1/notifications/:id/read` - acknowledge one of the caller's own
pub async fn mark_read(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    let updated = Notification::mark_read(&state.db, id, auth.user_id).await?;
    if !updated {
        return Err(ApiError::NotFound("Notification not found".to_string()));
    }

    Ok(ok("Notification read", serde_json::json!({ "id": id })))
}
