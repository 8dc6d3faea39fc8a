/// API route handlers
///
/// One module per resource:
///
/// - `health`: Health check endpoint
/// - `auth`: Registration, login, token refresh
/// - `users`: Account management
/// - `doctors`: Doctor profiles and availability
/// - `services`: Service catalog
/// - `appointments`: Booking, listing, lifecycle
/// - `medical_records`: Clinical records
/// - `invoices`: Billing
/// - `inventory`: Items and stock adjustment
/// - `attendance`: Staff check-in/out
/// - `notifications`: Per-user notifications
/// - `dashboard`: Clinic-wide aggregates

pub mod appointments;
pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod doctors;
pub mod health;
pub mod inventory;
pub mod invoices;
pub mod medical_records;
pub mod notifications;
pub mod services;
pub mod users;
