/// Inventory endpoints
///
/// Item CRUD plus the stock adjustment path. Quantity changes only happen
/// through `POST /:id/adjust`, which routes through
/// [`StockService`](clinicore_shared::stock::StockService) so the
/// never-negative guard and low-stock effect always apply.

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
    events::Outbox,
    models::inventory::{CreateInventoryItem, InventoryItem, UpdateInventoryItem},
    stock::StockService,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

/// Create item request
#[derive(Debug, Deserialize, Validate)]
pub struct CreateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 64, message = "SKU must be 1-64 characters"))]
    pub sku: String,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock_quantity: i32,

    #[validate(range(min = 0, message = "Reorder level cannot be negative"))]
    pub reorder_level: i32,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub unit_price_cents: i64,
}

/// Update item request (metadata only; stock goes through /adjust)
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateItemRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: Option<String>,

    #[validate(range(min = 0, message = "Reorder level cannot be negative"))]
    pub reorder_level: Option<i32>,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub unit_price_cents: Option<i64>,
}

/// Stock adjustment request
#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    /// Signed quantity change; negative consumes stock
    pub delta: i32,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListItemsQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,

    /// Only items at or below their reorder level
    pub low_stock: Option<bool>,
}

/// `POST /v1/inventory`
pub async fn create_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateItemRequest>,
) -> ApiResult<Json<Envelope<InventoryItem>>> {
    require(&auth, Capability::ManageInventory)?;
    req.validate()?;

    let item = InventoryItem::create(
        &state.db,
        CreateInventoryItem {
            name: req.name,
            sku: req.sku,
            stock_quantity: req.stock_quantity,
            reorder_level: req.reorder_level,
            unit_price_cents: req.unit_price_cents,
        },
    )
    .await?;

    Ok(ok("Item created", item))
}

/// `GET /v1/inventory`
pub async fn list_items(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListItemsQuery>,
) -> ApiResult<Json<Envelope<Vec<InventoryItem>>>> {
    require(&auth, Capability::ManageInventory)?;

    let items = if query.low_stock.unwrap_or(false) {
        InventoryItem::list_low_stock(&state.db).await?
    } else {
        let limit = query.limit.unwrap_or(50).clamp(1, 200);
        let offset = query.offset.unwrap_or(0).max(0);
        InventoryItem::list(&state.db, limit, offset).await?
    };

    Ok(ok("Items", items))
}

/// `GET /v1/inventory/:id`
pub async fn get_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<InventoryItem>>> {
    require(&auth, Capability::ManageInventory)?;

    let item = InventoryItem::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

    Ok(ok("Item", item))
}

/// `PUT /v1/inventory/:id` - metadata update
pub async fn update_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> ApiResult<Json<Envelope<InventoryItem>>> {
    require(&auth, Capability::ManageInventory)?;
    req.validate()?;

    let item = InventoryItem::update(
        &state.db,
        id,
        UpdateInventoryItem {
            name: req.name,
            reorder_level: req.reorder_level,
            unit_price_cents: req.unit_price_cents,
        },
    )
    .await?
    .ok_or_else(|| ApiError::NotFound("Item not found".to_string()))?;

    Ok(ok("Item updated", item))
}

/// `POST /v1/inventory/:id/adjust` - change stock by a signed delta
///
/// # Errors
///
/// - `409 Conflict`: the delta would drive stock negative; the quantity is
///   unchanged
pub async fn adjust_stock(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<AdjustStockRequest>,
) -> ApiResult<Json<Envelope<InventoryItem>>> {
    require(&auth, Capability::ManageInventory)?;

    if req.delta == 0 {
        return Err(ApiError::BadRequest("Delta cannot be zero".to_string()));
    }

    let service = StockService::new(state.db.clone());
    let outcome = service.adjust(id, req.delta, auth.user_id).await?;

    Outbox::enqueue_all(&state.db, &outcome.effects).await;

    Ok(ok("Stock adjusted", outcome.item))
}

/// `DELETE /v1/inventory/:id` - soft-delete an item
pub async fn delete_item(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::ManageInventory)?;

    let removed = InventoryItem::soft_delete(&state.db, id).await?;
    if !removed {
        return Err(ApiError::NotFound("Item not found".to_string()));
    }

    Ok(ok("Item removed", serde_json::json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_item_request_validation() {
        let valid = CreateItemRequest {
            name: "Nitrile gloves (M)".to_string(),
            sku: "GLV-M".to_string(),
            stock_quantity: 200,
            reorder_level: 50,
            unit_price_cents: 15,
        };
        assert!(valid.validate().is_ok());

        let negative_stock = CreateItemRequest {
            name: "Nitrile gloves (M)".to_string(),
            sku: "GLV-M".to_string(),
            stock_quantity: -1,
            reorder_level: 50,
            unit_price_cents: 15,
        };
        assert!(negative_stock.validate().is_err());
    }
}
