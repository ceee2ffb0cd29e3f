//! # Group Work Meter Backend
//!
//! Non-UI logic for the group work meter: a small time-tracking service where
//! members join groups via a 6-character code, log minutes against tasks, and
//! read aggregated per-member and per-task totals.
//!
//! ## Architecture
//!
//! The backend follows a layered architecture:
//! ```text
//! IO Layer (REST API, handlers, mappers)
//!     ↓
//! Domain Layer (services, aggregation, normalization)
//!     ↓
//! Storage Layer (JSON documents, atomic writes)
//! ```
//!
//! The `sync` module sits beside the layers as an adapter for realtime
//! collection snapshots.

pub mod domain;
pub mod io;
pub mod storage;
pub mod sync;

use std::sync::Arc;

use anyhow::Result;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::domain::{GroupService, UserService};
use crate::storage::JsonConnection;

/// Main application state that holds all services
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub group_service: GroupService,
}

impl AppState {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self {
            user_service: UserService::new(connection.clone()),
            group_service: GroupService::new(connection),
        }
    }
}

/// Initialize the backend with all required services
pub fn initialize_backend() -> Result<AppState> {
    info!("Setting up data directory");
    let connection = Arc::new(JsonConnection::new_default()?);

    info!("Setting up application state");
    Ok(AppState::new(connection))
}

/// Create the Axum router with all routes configured
pub fn create_router(app_state: AppState) -> Router {
    // CORS setup to allow the frontend to make requests
    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("http://localhost:8080"))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any);

    let api_routes = Router::new()
        .route(
            "/profile",
            get(io::profile_apis::get_profile).put(io::profile_apis::update_profile),
        )
        .route(
            "/groups",
            get(io::group_apis::list_groups).post(io::group_apis::create_group),
        )
        .route("/groups/join", post(io::group_apis::join_group))
        .route(
            "/groups/:group_id",
            get(io::group_apis::get_group).put(io::group_apis::update_group),
        )
        .route("/groups/:group_id/logs", post(io::worklog_apis::add_work_log))
        .route(
            "/groups/:group_id/tasks/:task_id/toggle",
            post(io::group_apis::toggle_task_complete),
        )
        .route(
            "/groups/:group_id/report",
            get(io::report_apis::get_group_report),
        );

    Router::new()
        .nest("/api", api_routes)
        .layer(cors)
        .with_state(app_state)
}
