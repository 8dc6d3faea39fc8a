/// Invoice model and database operations
///
/// An invoice bills a patient for one or more line items, optionally tied to
/// an appointment. Line items are stored as a JSONB array; the total is
/// computed from the items (`Σ quantity × unit_price_cents`) when the invoice
/// is created or its items change, and stored denormalized.
///
/// # Lifecycle
///
/// ```text
/// draft → issued → paid
///       → void     (from draft or issued)
/// ```
///
/// Paid and void invoices are locked: item and status mutations are refused.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::PgPool;
use uuid::Uuid;

/// Invoice lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invoice_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Editable, not yet sent to the patient
    Draft,

    /// Sent to the patient, awaiting payment
    Issued,

    /// Settled
    Paid,

    /// Cancelled; kept for the books
    Void,
}

impl InvoiceStatus {
    /// Status name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    /// Paid and void invoices refuse further mutation
    pub fn is_locked(&self) -> bool {
        matches!(self, InvoiceStatus::Paid | InvoiceStatus::Void)
    }

    /// Checks if transition to target status is valid
    pub fn can_transition_to(&self, target: InvoiceStatus) -> bool {
        match (self, target) {
            (InvoiceStatus::Draft, InvoiceStatus::Issued) => true,
            (InvoiceStatus::Draft, InvoiceStatus::Void) => true,
            (InvoiceStatus::Issued, InvoiceStatus::Paid) => true,
            (InvoiceStatus::Issued, InvoiceStatus::Void) => true,
            _ => false,
        }
    }
}

/// One invoice line item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceItem {
    /// What is billed
    pub description: String,

    /// Quantity
    pub quantity: i64,

    /// Price per unit in cents
    pub unit_price_cents: i64,
}

/// Computes an invoice total from its line items
pub fn compute_total(items: &[InvoiceItem]) -> i64 {
    items
        .iter()
        .map(|item| item.quantity * item.unit_price_cents)
        .sum()
}

/// Invoice model
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    /// Unique invoice ID
    pub id: Uuid,

    /// Billed patient
    pub patient_id: Uuid,

    /// Appointment the invoice covers, if any
    pub appointment_id: Option<Uuid>,

    /// Line items (JSONB)
    pub items: Json<Vec<InvoiceItem>>,

    /// Denormalized total in cents
    pub total_cents: i64,

    /// Lifecycle status
    pub status: InvoiceStatus,

    /// Soft-delete flag
    pub deleted: bool,

    /// When the invoice was created
    pub created_at: DateTime<Utc>,

    /// When the invoice was last updated
    pub updated_at: DateTime<Utc>,
}

/// Input for creating an invoice
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub patient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub items: Vec<InvoiceItem>,
}

impl Invoice {
    /// Creates an invoice in draft state
    ///
    /// The total is computed from the line items here; callers never supply
    /// it.
    pub async fn create(pool: &PgPool, data: CreateInvoice) -> Result<Self, sqlx::Error> {
        let total = compute_total(&data.items);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (patient_id, appointment_id, items, total_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING id, patient_id, appointment_id, items, total_cents, status,
                      deleted, created_at, updated_at
            "#,
        )
        .bind(data.patient_id)
        .bind(data.appointment_id)
        .bind(Json(data.items))
        .bind(total)
        .fetch_one(pool)
        .await?;

        Ok(invoice)
    }

    /// Finds an invoice by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, patient_id, appointment_id, items, total_cents, status,
                   deleted, created_at, updated_at
            FROM invoices
            WHERE id = $1 AND NOT deleted
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Lists invoices for one patient, newest first
    pub async fn list_for_patient(
        pool: &PgPool,
        patient_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, patient_id, appointment_id, items, total_cents, status,
                   deleted, created_at, updated_at
            FROM invoices
            WHERE patient_id = $1 AND NOT deleted
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(patient_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(invoices)
    }

    /// Lists all invoices, newest first
    pub async fn list(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<Self>, sqlx::Error> {
        let invoices = sqlx::query_as::<_, Invoice>(
            r#"
            SELECT id, patient_id, appointment_id, items, total_cents, status,
                   deleted, created_at, updated_at
            FROM invoices
            WHERE NOT deleted
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(invoices)
    }

    /// Replaces the line items of an unlocked invoice
    ///
    /// Recomputes the total. The lock guard lives in the WHERE clause so a
    /// paid or void invoice is never touched; None means the invoice is
    /// absent or locked.
    pub async fn replace_items(
        pool: &PgPool,
        id: Uuid,
        items: Vec<InvoiceItem>,
    ) -> Result<Option<Self>, sqlx::Error> {
        let total = compute_total(&items);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET items = $2, total_cents = $3, updated_at = NOW()
            WHERE id = $1 AND status IN ('draft', 'issued') AND NOT deleted
            RETURNING id, patient_id, appointment_id, items, total_cents, status,
                      deleted, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(Json(items))
        .bind(total)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Transitions an invoice to a new status
    ///
    /// The valid-transition check runs in the service layer via
    /// [`InvoiceStatus::can_transition_to`]; this method additionally guards
    /// against locked rows in the WHERE clause.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        target: InvoiceStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('draft', 'issued') AND NOT deleted
            RETURNING id, patient_id, appointment_id, items, total_cents, status,
                      deleted, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(target)
        .fetch_optional(pool)
        .await?;

        Ok(invoice)
    }

    /// Soft-deletes an invoice
    pub async fn soft_delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE invoices SET deleted = TRUE, updated_at = NOW() WHERE id = $1 AND NOT deleted",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Sum of unpaid (issued) invoice totals
    ///
    /// Dashboard aggregate.
    pub async fn outstanding_total(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (total,): (Option<i64>,) = sqlx::query_as(
            "SELECT SUM(total_cents) FROM invoices WHERE status = 'issued' AND NOT deleted",
        )
        .fetch_one(pool)
        .await?;

        Ok(total.unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<InvoiceItem> {
        vec![
            InvoiceItem {
                description: "Consultation".to_string(),
                quantity: 1,
                unit_price_cents: 5000,
            },
            InvoiceItem {
                description: "Blood panel".to_string(),
                quantity: 2,
                unit_price_cents: 1250,
            },
        ]
    }

    #[test]
    fn test_compute_total() {
        assert_eq!(compute_total(&items()), 5000 + 2 * 1250);
        assert_eq!(compute_total(&[]), 0);
    }

    #[test]
    fn test_invoice_status_locked() {
        assert!(!InvoiceStatus::Draft.is_locked());
        assert!(!InvoiceStatus::Issued.is_locked());
        assert!(InvoiceStatus::Paid.is_locked());
        assert!(InvoiceStatus::Void.is_locked());
    }

    #[test]
    fn test_invoice_status_transitions() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Issued));
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Void));
        assert!(InvoiceStatus::Issued.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Issued.can_transition_to(InvoiceStatus::Void));

        assert!(!InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Paid));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Issued));
        assert!(!InvoiceStatus::Void.can_transition_to(InvoiceStatus::Draft));
    }
}
