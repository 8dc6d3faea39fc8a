/// Application state and router builder
///
/// This module defines the shared application state and builds the Axum
/// router with all routes and middleware.
///
/// # Example
///
/// ```no_run
/// use clinicore_api::{app::AppState, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = clinicore_api::app::build_router(state);
/// # Ok(())
/// # }
/// ```

use crate::error::ApiError;
use axum::{
    extract::Request,
    http::{header, HeaderValue, Method},
    middleware::Next,
    response::Response,
    routing::{get, patch, post, put},
    Router,
};
use clinicore_shared::auth::{jwt, middleware::AuthContext};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor. Uses Arc
/// internally for cheap cloning.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Creates new application state
    pub fn new(db: PgPool, config: Config) -> Self {
        Self {
            db,
            config: Arc::new(config),
        }
    }

    /// Gets JWT secret for token operations
    pub fn jwt_secret(&self) -> &str {
        &self.config.jwt.secret
    }
}

/// Builds the complete Axum router with all routes and middleware
///
/// # Architecture
///
/// ```text
/// /
/// ├── /health                         # Health check (public)
/// └── /v1/                            # API v1 (versioned)
///     ├── /auth/                      # register, login, refresh (public)
///     ├── /users/                     # account management
///     ├── /doctors/                   # profiles + availability
///     ├── /services/                  # service catalog
///     ├── /appointments/              # booking, listing, lifecycle
///     ├── /medical-records/
///     ├── /invoices/
///     ├── /inventory/                 # items + stock adjustment
///     ├── /attendance/
///     ├── /notifications/
///     └── /dashboard/
/// ```
///
/// Everything under `/v1` except `/v1/auth` sits behind the JWT middleware,
/// which injects [`AuthContext`] into request extensions.
pub fn build_router(state: AppState) -> Router {
    use crate::routes;

    // Health check (public, no auth)
    let health_routes = Router::new().route("/health", get(routes::health::health_check));

    // Auth routes (public, no auth required)
    let auth_routes = Router::new()
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route("/refresh", post(routes::auth::refresh));

    // Everything else requires a valid access token
    let protected_routes = Router::new()
        .route("/users", post(routes::users::create_user))
        .route("/users", get(routes::users::list_users))
        .route("/users/:id", get(routes::users::get_user))
        .route("/users/:id", put(routes::users::update_user))
        .route("/users/:id/deactivate", post(routes::users::deactivate_user))
        .route("/doctors", post(routes::doctors::create_doctor))
        .route("/doctors", get(routes::doctors::list_doctors))
        .route("/doctors/:id", get(routes::doctors::get_doctor))
        .route("/doctors/:id", put(routes::doctors::update_doctor))
        .route("/doctors/:id", axum::routing::delete(routes::doctors::delete_doctor))
        .route("/doctors/:id/availability", get(routes::doctors::get_availability))
        .route("/doctors/:id/availability", put(routes::doctors::set_availability))
        .route("/services", post(routes::services::create_service))
        .route("/services", get(routes::services::list_services))
        .route("/services/:id", put(routes::services::update_service))
        .route("/services/:id", axum::routing::delete(routes::services::delete_service))
        .route("/appointments", post(routes::appointments::book_appointment))
        .route("/appointments", get(routes::appointments::list_appointments))
        .route("/appointments/:id", get(routes::appointments::get_appointment))
        .route("/appointments/:id/reschedule", patch(routes::appointments::reschedule_appointment))
        .route("/appointments/:id/status", patch(routes::appointments::update_status))
        .route("/appointments/:id/payment", patch(routes::appointments::update_payment))
        .route("/appointments/:id", axum::routing::delete(routes::appointments::delete_appointment))
        .route("/medical-records", post(routes::medical_records::create_record))
        .route("/medical-records", get(routes::medical_records::list_records))
        .route("/medical-records/:id", get(routes::medical_records::get_record))
        .route("/medical-records/:id", put(routes::medical_records::update_record))
        .route("/medical-records/:id", axum::routing::delete(routes::medical_records::delete_record))
        .route("/invoices", post(routes::invoices::create_invoice))
        .route("/invoices", get(routes::invoices::list_invoices))
        .route("/invoices/:id", get(routes::invoices::get_invoice))
        .route("/invoices/:id/items", put(routes::invoices::replace_items))
        .route("/invoices/:id/status", patch(routes::invoices::update_status))
        .route("/invoices/:id", axum::routing::delete(routes::invoices::delete_invoice))
        .route("/inventory", post(routes::inventory::create_item))
        .route("/inventory", get(routes::inventory::list_items))
        .route("/inventory/:id", get(routes::inventory::get_item))
        .route("/inventory/:id", put(routes::inventory::update_item))
        .route("/inventory/:id/adjust", post(routes::inventory::adjust_stock))
        .route("/inventory/:id", axum::routing::delete(routes::inventory::delete_item))
        .route("/attendance/check-in", post(routes::attendance::check_in))
        .route("/attendance/check-out", post(routes::attendance::check_out))
        .route("/attendance/mark", post(routes::attendance::mark))
        .route("/attendance", get(routes::attendance::list_attendance))
        .route("/notifications", get(routes::notifications::list_notifications))
        .route("/notifications/:id/read", patch(routes::notifications::mark_read))
        .route("/dashboard/summary", get(routes::dashboard::summary))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            jwt_auth_layer,
        ));

    let v1_routes = Router::new()
        .nest("/auth", auth_routes)
        .merge(protected_routes);

    // Configure CORS based on environment
    let cors = if state.config.api.cors_origins.contains(&"*".to_string()) {
        CorsLayer::permissive()
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .api
            .cors_origins
            .iter()
            .filter_map(|origin| origin.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
            .allow_credentials(true)
            .max_age(std::time::Duration::from_secs(3600))
    };

    Router::new()
        .merge(health_routes)
        .nest("/v1", v1_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors)
        .with_state(state)
}

/// JWT authentication middleware layer
///
/// Extracts and validates the Bearer token from the Authorization header,
/// then injects [`AuthContext`] into request extensions for handlers to
/// pass down explicitly.
async fn jwt_auth_layer(
    state: axum::extract::State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let auth_header = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::BadRequest("Expected Bearer token".to_string()))?;

    let claims = jwt::validate_access_token(token, state.jwt_secret())?;

    let auth_context = AuthContext::new(claims.sub, claims.role);
    req.extensions_mut().insert(auth_context);

    Ok(next.run(req).await)
}
