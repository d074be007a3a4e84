//! # KuBel HTTP API Module
//!
//! This module implements the HTTP REST API server using axum.
//!
//! ## Endpoints
//!
//! - `GET /health` - Health check
//! - `GET /categories` - Category definitions
//! - `GET /people` / `POST /people` - List or create people
//! - `GET /people/{id}` / `DELETE /people/{id}` - Read or delete a person
//! - `PUT /people/{id}/name` - Rename
//! - `POST /people/{id}/selections` - Click an entry (toggle + auto-completion)
//! - `PUT /people/{id}/birthday` - Set or clear the birthday
//! - `PUT /people/{id}/note` - Set the free-text note
//! - `PUT /people/{id}/display` - Chart baseline and minimum value
//! - `GET /people/{id}/phases/{category}` - Phase results of one category
//! - `GET /people/{id}/chart` - Development chart points
//! - `GET /people/{id}/report` / `POST /people/{id}/report` - Printable report
//! - `GET /people/{id}/print-options` - Default print options
//! - `GET /config` / `PUT /config/personlist` - App configuration
//! - `GET /update` / `POST /update/check` - Update status
//!
//! ## Security Configuration (Environment Variables)
//!
//! - `KUBEL_CORS_ORIGINS`: Comma-separated list of allowed origins, or "*" for all (default: localhost only)
//! - `KUBEL_RATE_LIMIT`: Requests per second (default: 100, 0 to disable)
//! - `KUBEL_API_KEY`: If set, requires Bearer token authentication

mod auth;
mod handlers;
mod middleware;
mod types;

pub use auth::{API_KEY_ENV, get_api_key_from_env};
pub use middleware::{RATE_LIMIT_ENV, create_rate_limiter, get_rate_limit_from_env};
pub use types::{
    ApiError, BirthdayRequest, DisplaySettingsRequest, ErrorResponse, HealthResponse,
    NameRequest, NoteRequest, PersonListOrderRequest, PersonResponse, PersonSummary,
    SelectionRequest, SelectionResponse,
};

use crate::updater;
use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware as axum_middleware,
    routing::{get, post, put},
};
use kubel_core::{
    CURRENT_VERSION, CategoryData, Config, Data, Gateway, KubelError, UpdateState,
    load_category_data, load_config, load_data, save_data,
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Environment variable holding the allowed CORS origins.
pub const CORS_ORIGINS_ENV: &str = "KUBEL_CORS_ORIGINS";

/// Request bodies above this size are rejected.
const MAX_BODY_SIZE: usize = 2 * 1024 * 1024;

// =============================================================================
// SERVER STATE
// =============================================================================

/// Shared server state.
///
/// The category definitions are read once at startup and never change
/// while the server runs.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<dyn Gateway>,
    pub schema: Arc<CategoryData>,
    pub data: Arc<RwLock<Data>>,
    pub config: Arc<RwLock<Config>>,
    pub update: Arc<RwLock<UpdateState>>,
    /// Manifest URL used by `POST /update/check`.
    pub update_url: String,
}

impl AppState {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn Gateway>,
        schema: CategoryData,
        data: Data,
        config: Config,
    ) -> Self {
        Self {
            gateway,
            schema: Arc::new(schema),
            data: Arc::new(RwLock::new(data)),
            config: Arc::new(RwLock::new(config)),
            update: Arc::new(RwLock::new(UpdateState::new(CURRENT_VERSION))),
            update_url: updater::update_url_from_env(),
        }
    }

    /// Load the three documents and reconcile every person.
    ///
    /// The store is written back only when reconciliation changed it.
    pub fn load(gateway: Arc<dyn Gateway>) -> Result<Self, KubelError> {
        let schema = load_category_data(gateway.as_ref())?;
        let mut data = load_data(gateway.as_ref())?;
        let config = load_config(gateway.as_ref())?;

        let report = data.sync_all(&schema);
        if !report.is_unchanged() {
            tracing::info!(?report, "Stored evaluations reconciled with category definitions");
            save_data(gateway.as_ref(), &data)?;
        }

        Ok(Self::new(gateway, schema, data, config))
    }

    /// Use a different manifest URL.
    #[must_use]
    pub fn with_update_url(mut self, url: impl Into<String>) -> Self {
        self.update_url = url.into();
        self
    }
}

// =============================================================================
// CORS CONFIGURATION
// =============================================================================

/// Build CORS layer from `KUBEL_CORS_ORIGINS`.
///
/// - `*`: allows all origins
/// - not set: localhost only
/// - otherwise: comma-separated list of allowed origins
fn build_cors_layer() -> CorsLayer {
    let origins_env = std::env::var(CORS_ORIGINS_ENV).ok();

    match origins_env.as_deref() {
        Some("*") => {
            tracing::warn!(
                "CORS: Allowing ALL origins (KUBEL_CORS_ORIGINS=*). This is insecure for production!"
            );
            CorsLayer::permissive()
        }
        Some(origins) => {
            let allowed_origins: Vec<HeaderValue> = origins
                .split(',')
                .filter_map(|s| {
                    let trimmed = s.trim();
                    match trimmed.parse::<HeaderValue>() {
                        Ok(hv) => {
                            tracing::info!("CORS: Allowing origin: {}", trimmed);
                            Some(hv)
                        }
                        Err(e) => {
                            tracing::warn!("CORS: Invalid origin '{}': {}", trimmed, e);
                            None
                        }
                    }
                })
                .collect();

            if allowed_origins.is_empty() {
                tracing::warn!(
                    "CORS: No valid origins in KUBEL_CORS_ORIGINS, defaulting to localhost only"
                );
                build_localhost_cors()
            } else {
                with_methods(CorsLayer::new().allow_origin(allowed_origins))
            }
        }
        None => {
            tracing::info!("CORS: No KUBEL_CORS_ORIGINS set, defaulting to localhost only");
            build_localhost_cors()
        }
    }
}

fn build_localhost_cors() -> CorsLayer {
    let origins: Vec<HeaderValue> = [
        "http://localhost:3000",
        "http://localhost:8080",
        "http://127.0.0.1:3000",
        "http://127.0.0.1:8080",
    ]
    .into_iter()
    .filter_map(|origin| origin.parse::<HeaderValue>().ok())
    .collect();

    with_methods(CorsLayer::new().allow_origin(origins))
}

fn with_methods(layer: CorsLayer) -> CorsLayer {
    layer
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// =============================================================================
// ROUTER CREATION
// =============================================================================

/// Create the axum router with all endpoints and middleware.
///
/// Middleware stack (outer to inner):
/// 1. Tracing
/// 2. CORS
/// 3. Body limit
/// 4. Rate limiting (if enabled)
/// 5. Authentication (if configured)
pub fn create_router(state: AppState) -> Router {
    let cors = build_cors_layer();

    let rate_limit = get_rate_limit_from_env();
    let rate_limiter = if rate_limit > 0 {
        tracing::info!("Rate limiting enabled: {} requests/second", rate_limit);
        Some(create_rate_limiter(rate_limit))
    } else {
        tracing::info!("Rate limiting disabled");
        None
    };

    let has_auth = get_api_key_from_env().is_some();
    if has_auth {
        tracing::info!("API key authentication enabled");
    } else {
        tracing::warn!(
            "API key authentication DISABLED - all endpoints are publicly accessible! \
             Set KUBEL_API_KEY environment variable to enable authentication."
        );
    }

    let mut router = Router::new()
        .route("/health", get(handlers::health_handler))
        .route("/categories", get(handlers::categories_handler))
        .route(
            "/people",
            get(handlers::list_people_handler).post(handlers::create_person_handler),
        )
        .route(
            "/people/{id}",
            get(handlers::get_person_handler).delete(handlers::delete_person_handler),
        )
        .route("/people/{id}/name", put(handlers::rename_person_handler))
        .route("/people/{id}/selections", post(handlers::select_handler))
        .route("/people/{id}/birthday", put(handlers::birthday_handler))
        .route("/people/{id}/note", put(handlers::note_handler))
        .route(
            "/people/{id}/display",
            put(handlers::display_settings_handler),
        )
        .route(
            "/people/{id}/phases/{category}",
            get(handlers::phases_handler),
        )
        .route("/people/{id}/chart", get(handlers::chart_handler))
        .route(
            "/people/{id}/report",
            get(handlers::report_handler).post(handlers::custom_report_handler),
        )
        .route(
            "/people/{id}/print-options",
            get(handlers::print_options_handler),
        )
        .route("/config", get(handlers::get_config_handler))
        .route(
            "/config/personlist",
            put(handlers::person_list_order_handler),
        )
        .route("/update", get(handlers::update_state_handler))
        .route("/update/check", post(handlers::update_check_handler));

    if has_auth {
        router = router.layer(axum_middleware::from_fn(auth::api_key_auth_middleware));
    }

    if let Some(limiter) = rate_limiter {
        router = router.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit_middleware,
        ));
    }

    router
        .layer(axum::extract::DefaultBodyLimit::max(MAX_BODY_SIZE))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// =============================================================================
// SERVER STARTUP
// =============================================================================

/// Start the HTTP server.
pub async fn run_server(addr: &str, state: AppState) -> Result<(), KubelError> {
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| KubelError::IoError(format!("Bind failed: {}", e)))?;

    tracing::info!("KuBel HTTP server listening on {}", addr);

    axum::serve(listener, router)
        .await
        .map_err(|e| KubelError::IoError(format!("Server error: {}", e)))
}
