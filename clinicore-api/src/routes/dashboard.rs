/// Dashboard endpoint
///
/// Clinic-wide aggregates for the admin/front-desk landing page. All counts
/// come from simple aggregate queries; nothing here mutates state.

use crate::{app::AppState, error::ApiResult, response::{ok, Envelope}};
use axum::{extract::{Extension, State}, Json};
use chrono::Utc;
use clinicore_shared::{
    auth::{
        authorization::{require, Capability},
        middleware::AuthContext,
    },
    models::{
        appointment::{Appointment, AppointmentStatus},
        attendance::{AttendanceRecord, AttendanceStatus},
        inventory::InventoryItem,
        invoice::Invoice,
        user::User,
    },
};
use serde::Serialize;

/// Dashboard summary response
#[derive(Debug, Serialize)]
pub struct DashboardSummary {
    /// Appointments scheduled for today
    pub appointments_today: i64,

    /// Appointments completed today
    pub completed_today: i64,

    /// Appointments cancelled today
    pub cancelled_today: i64,

    /// No-shows today
    pub no_shows_today: i64,

    /// Total of issued, unpaid invoices in cents
    pub outstanding_invoice_cents: i64,

    /// Inventory items at or below reorder level
    pub low_stock_items: i64,

    /// Staff members marked present today
    pub staff_present_today: i64,

    /// Total registered accounts
    pub total_users: i64,
}

/// `GET /v1/dashboard/summary` - admin and front desk
pub async fn summary(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Envelope<DashboardSummary>>> {
    require(&auth, Capability::ViewDashboard)?;

    let today = Utc::now().date_naive();

    let summary = DashboardSummary {
        appointments_today: Appointment::count_on_date(
            &state.db,
            today,
            AppointmentStatus::Scheduled,
        )
        .await?,
        completed_today: Appointment::count_on_date(
            &state.db,
            today,
            AppointmentStatus::Completed,
        )
        .await?,
        cancelled_today: Appointment::count_on_date(
            &state.db,
            today,
            AppointmentStatus::Cancelled,
        )
        .await?,
        no_shows_today: Appointment::count_on_date(&state.db, today, AppointmentStatus::NoShow)
            .await?,
        outstanding_invoice_cents: Invoice::outstanding_total(&state.db).await?,
        low_stock_items: InventoryItem::count_low_stock(&state.db).await?,
        staff_present_today: AttendanceRecord::list_on_date(&state.db, today)
            .await?
            .iter()
            .filter(|r| r.status == AttendanceStatus::Present)
            .count() as i64,
        total_users: User::count(&state.db).await?,
    };

    Ok(ok("Dashboard", summary))
}
