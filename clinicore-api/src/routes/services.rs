/// Service catalog endpoints
///
/// Admins and receptionists maintain the catalog; any authenticated caller
/// can browse it when booking.

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
        authorization::{require, Capability},
        middleware::AuthContext,
    },
    models::service::{ClinicService, CreateService, UpdateService},
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create service request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateServiceRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i64,

    #[validate(range(min = 5, max = 480, message = "Duration must be 5-480 minutes"))]
    pub duration_minutes: i32,
}

/// Update service request
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateServiceRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    pub description: Option<String>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: Option<i64>,

    #[validate(range(min = 5, max = 480, message = "Duration must be 5-480 minutes"))]
    pub duration_minutes: Option<i32>,

    pub active: Option<bool>,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListServicesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// `POST /v1/services`
pub async fn create_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateServiceRequest>,
) -> ApiResult<Json<Envelope<ClinicService>>> {
    require(&auth, Capability::ManageServices)?;
    req.validate()?;

    let service = ClinicService::create(
        &state.db,
        CreateService {
            name: req.name,
            description: req.description,
            price_cents: req.price_cents,
            duration_minutes: req.duration_minutes,
        },
    )
    .await?;

    Ok(ok("Service created", service))
}

/// `GET /v1/services` - browse the catalog (any authenticated caller)
pub async fn list_services(
    State(state): State<AppState>,
    Query(query): Query<ListServicesQuery>,
) -> ApiResult<Json<Envelope<Vec<ClinicService>>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let services = ClinicService::list(&state.db, limit, offset).await?;

    Ok(ok("Services", services))
}

/// `PUT /v1/services/:id`
pub async fn update_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateServiceRequest>,
) -> ApiResult<Json<Envelope<ClinicService>>> {
    require(&auth, Capability::ManageServices)?;
    req.validate()?;

    let service = ClinicService::update(
        &state.db,
        id,
        UpdateService {
            name: req.name,
            description: req.description,
            price_cents: req.price_cents,
            duration_minutes: req.duration_minutes,
            active: req.active,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Service not found".to_string()))?;

    Ok(ok("Service updated", service))
}

/// `DELETE /v1/services/:id` - soft delete
pub async fn delete_service(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::ManageServices)?;

    let removed = ClinicService::soft_delete(&state.db, id).await?;
    if !removed {
        return Err(ApiError::NotFound("Service not found".to_string()));
    }

    Ok(ok("Service removed", serde_json::json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_service_request_validation() {
        let valid = CreateServiceRequest {
            name: "General consultation".to_string(),
            description: None,
            price_cents: 5000,
            duration_minutes: 30,
        };
        assert!(valid.validate().is_ok());

        let too_short = CreateServiceRequest {
            name: "X-ray".to_string(),
            description: None,
            price_cents: 5000,
            duration_minutes: 2,
        };
        assert!(too_short.validate().is_err());
    }
}
