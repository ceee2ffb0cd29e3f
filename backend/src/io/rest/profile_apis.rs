//! # REST API for the Local Profile
//!
//! Endpoints for reading and updating the single local user.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::mappers::UserMapper;
use super::map_service_error;
use crate::AppState;
use shared::{UpdateProfileRequest, UpdateProfileResponse};

/// Get the local user, creating a default one on first access
pub async fn get_profile(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/profile");

    match state.user_service.get_or_create_user() {
        Ok(user) => (StatusCode::OK, Json(UserMapper::to_dto(user))).into_response(),
        Err(e) => map_service_error("Failed to load profile", e),
    }
}

/// Partially update the profile; the new name/avatar cascades into rosters
pub async fn update_profile(
    State(state): State<AppState>,
    Json(request): Json<UpdateProfileRequest>,
) -> impl IntoResponse {
    info!("PUT /api/profile");

    let command = UserMapper::to_update_command(request);
    match state.user_service.update_profile(command) {
        Ok(result) => {
            let response = UpdateProfileResponse {
                user: UserMapper::to_dto(result.user),
                success_message: "Profile updated".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_service_error("Failed to update profile", e),
    }
}
