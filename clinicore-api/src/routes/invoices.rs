/// Invoice endpoints
///
/// Front desk creates and manages invoices; patients read their own. Totals
/// are computed from line items in the model layer; paid and void invoices
/// refuse mutation.

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
    events::{Effect, Outbox},
    models::{
        invoice::{CreateInvoice, Invoice, InvoiceItem, InvoiceStatus},
        user::{Role, User},
    },
    visibility::{invoice_scope, list_invoices as scoped_list, VisibilityScope},
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

/// Create invoice request
#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub items: Vec<InvoiceItem>,
}

/// Replace items request
#[derive(Debug, Deserialize)]
pub struct ReplaceItemsRequest {
    pub items: Vec<InvoiceItem>,
}

/// Status update request
#[derive(Debug, Deserialize)]
pub struct InvoiceStatusRequest {
    pub status: InvoiceStatus,
}

/// List query parameters
#[derive(Debug, Default, Deserialize)]
pub struct ListInvoicesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

fn validate_items(items: &[InvoiceItem]) -> Result<(), ApiError> {
    if items.is_empty() {
        return Err(ApiError::BadRequest(
            "Invoice needs at least one line item".to_string(),
        ));
    }
    for item in items {
        if item.description.trim().is_empty() {
            return Err(ApiError::BadRequest(
                "Line item description cannot be empty".to_string(),
            ));
        }
        if item.quantity <= 0 {
            return Err(ApiError::BadRequest(
                "Line item quantity must be positive".to_string(),
            ));
        }
        if item.unit_price_cents < 0 {
            return Err(ApiError::BadRequest(
                "Line item price cannot be negative".to_string(),
            ));
        }
    }
    Ok(())
}

/// `POST /v1/invoices`
pub async fn create_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateInvoiceRequest>,
) -> ApiResult<Json<Envelope<Invoice>>> {
    require(&auth, Capability::ManageInvoices)?;
    validate_items(&req.items)?;

    User::find_by_id(&state.db, req.patient_id)
        .await?
        .filter(|u| u.role == Role::Patient)
        .ok_or_else(|| ApiError::NotFound("Patient not found".to_string()))?;

    let invoice = Invoice::create(
        &state.db,
        CreateInvoice {
            patient_id: req.patient_id,
            appointment_id: req.appointment_id,
            items: req.items,
        },
    )
    .await?;

    Outbox::enqueue_all(
        &state.db,
        &[Effect::audit(
            Some(auth.user_id),
            "invoice.created",
            "invoice",
            invoice.id,
            json!({ "total_cents": invoice.total_cents }),
        )],
    )
    .await;

    Ok(ok("Invoice created", invoice))
}

/// `GET /v1/invoices` - role-scoped listing
pub async fn list_invoices(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<ListInvoicesQuery>,
) -> ApiResult<Json<Envelope<Vec<Invoice>>>> {
    let limit = query.limit.unwrap_or(50).clamp(1, 200);
    let offset = query.offset.unwrap_or(0).max(0);

    let scope = invoice_scope(&auth);
    let invoices = scoped_list(&state.db, &scope, limit, offset).await?;

    Ok(ok("Invoices", invoices))
}

/// `GET /v1/invoices/:id` - fetch one invoice, scope-checked
pub async fn get_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Invoice>>> {
    let invoice = Invoice::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    let visible = match invoice_scope(&auth) {
        VisibilityScope::All => true,
        VisibilityScope::Patient(user_id) => invoice.patient_id == user_id,
        _ => false,
    };
    if !visible {
        return Err(ApiError::NotFound("Invoice not found".to_string()));
    }

    Ok(ok("Invoice", invoice))
}

/// `PUT /v1/invoices/:id/items` - replace line items and recompute total
///
/// # Errors
///
/// - `409 Conflict`: the invoice is paid or void
pub async fn replace_items(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<ReplaceItemsRequest>,
) -> ApiResult<Json<Envelope<Invoice>>> {
    require(&auth, Capability::ManageInvoices)?;
    validate_items(&req.items)?;

    // Distinguish absent from locked for the error message
    let existing = Invoice::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;
    if existing.status.is_locked() {
        return Err(ApiError::Conflict(format!(
            "Invoice is {} and cannot be modified",
            existing.status.as_str()
        )));
    }

    let invoice = Invoice::replace_items(&state.db, id, req.items)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    Ok(ok("Invoice updated", invoice))
}

/// `PATCH /v1/invoices/:id/status` - issue, settle or void
pub async fn update_status(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<InvoiceStatusRequest>,
) -> ApiResult<Json<Envelope<Invoice>>> {
    require(&auth, Capability::ManageInvoices)?;

    let existing = Invoice::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    if !existing.status.can_transition_to(req.status) {
        return Err(ApiError::BadRequest(format!(
            "Invalid invoice transition from {} to {}",
            existing.status.as_str(),
            req.status.as_str()
        )));
    }

    let invoice = Invoice::transition(&state.db, id, req.status)
        .await?
        .ok_or_else(|| ApiError::Conflict("Invoice can no longer be modified".to_string()))?;

    Outbox::enqueue_all(
        &state.db,
        &[Effect::audit(
            Some(auth.user_id),
            "invoice.status_changed",
            "invoice",
            invoice.id,
            json!({ "from": existing.status.as_str(), "to": req.status.as_str() }),
        )],
    )
    .await;

    Ok(ok("Invoice status updated", invoice))
}

/// `DELETE /v1/invoices/:id` - soft-delete a draft
///
/// Issued, paid and void invoices stay on the books; only drafts can be
/// discarded.
pub async fn delete_invoice(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Envelope<serde_json::Value>>> {
    require(&auth, Capability::ManageInvoices)?;

    let invoice = Invoice::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Invoice not found".to_string()))?;

    if invoice.status != InvoiceStatus::Draft {
        return Err(ApiError::Conflict(
            "Only draft invoices can be removed; void it instead".to_string(),
        ));
    }

    Invoice::soft_delete(&state.db, id).await?;

    Ok(ok("Invoice removed", serde_json::json!({ "id": id })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_items() {
        assert!(validate_items(&[]).is_err());

        let good = vec![InvoiceItem {
            description: "Consultation".to_string(),
            quantity: 1,
            unit_price_cents: 5000,
        }];
        assert!(validate_items(&good).is_ok());

        let zero_quantity = vec![InvoiceItem {
            description: "Consultation".to_string(),
            quantity: 0,
            unit_price_cents: 5000,
        }];
        assert!(validate_items(&zero_quantity).is_err());

        let negative_price = vec![InvoiceItem {
            description: "Consultation".to_string(),
            quantity: 1,
            unit_price_cents: -5,
        }];
        assert!(validate_items(&negative_price).is_err());
    }
}
