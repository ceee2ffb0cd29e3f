//! # REST API for Group Management
//!
//! Endpoints for creating, joining, listing, and updating groups.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::mappers::GroupMapper;
use super::map_service_error;
use crate::domain::commands::group::ToggleTaskCompleteCommand;
use crate::AppState;
use shared::{
    CreateGroupRequest, CreateGroupResponse, GroupListResponse, JoinGroupRequest,
    JoinGroupResponse, ToggleTaskResponse, UpdateGroupRequest,
};

/// List all locally known groups plus the active-group pointer
pub async fn list_groups(State(state): State<AppState>) -> impl IntoResponse {
    info!("GET /api/groups");

    match state.group_service.list_groups() {
        Ok(result) => {
            let response = GroupListResponse {
                groups: result.groups.into_iter().map(GroupMapper::to_dto).collect(),
                current_group_id: result.current_group_id,
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_service_error("Failed to list groups", e),
    }
}

/// Create a new group
pub async fn create_group(
    State(state): State<AppState>,
    Json(request): Json<CreateGroupRequest>,
) -> impl IntoResponse {
    info!("POST /api/groups - name: {:?}", request.name);

    let command = GroupMapper::to_create_command(request);
    match state.group_service.create_group(command) {
        Ok(result) => {
            let response = CreateGroupResponse {
                group: GroupMapper::to_dto(result.group),
                success_message: "Group created".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => map_service_error("Failed to create group", e),
    }
}

/// Get a group by ID
pub async fn get_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/groups/{}", group_id);

    match state.group_service.get_group(&group_id) {
        Ok(Some(group)) => (StatusCode::OK, Json(GroupMapper::to_dto(group))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => map_service_error("Failed to get group", e),
    }
}

/// Partially update a group's metadata
pub async fn update_group(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<UpdateGroupRequest>,
) -> impl IntoResponse {
    info!("PUT /api/groups/{}", group_id);

    let command = GroupMapper::to_update_command(&group_id, request);
    match state.group_service.update_group(command) {
        Ok(Some(group)) => (StatusCode::OK, Json(GroupMapper::to_dto(group))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => map_service_error("Failed to update group", e),
    }
}

/// Join a group by its code
pub async fn join_group(
    State(state): State<AppState>,
    Json(request): Json<JoinGroupRequest>,
) -> impl IntoResponse {
    info!("POST /api/groups/join - code: {:?}", request.code);

    let command = GroupMapper::to_join_command(request);
    match state.group_service.join_group_by_code(command) {
        Ok(result) => {
            let response = JoinGroupResponse {
                group: GroupMapper::to_dto(result.group),
                success_message: "Joined group".to_string(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => map_service_error("Failed to join group", e),
    }
}

/// Flip a task's completed state
pub async fn toggle_task_complete(
    State(state): State<AppState>,
    Path((group_id, task_id)): Path<(String, String)>,
) -> impl IntoResponse {
    info!("POST /api/groups/{}/tasks/{}/toggle", group_id, task_id);

    let command = ToggleTaskCompleteCommand {
        group_id,
        task_id: task_id.clone(),
    };
    match state.group_service.toggle_task_complete(command) {
        Ok(result) => match result.now_completed {
            Some(completed) => {
                let response = ToggleTaskResponse { task_id, completed };
                (StatusCode::OK, Json(response)).into_response()
            }
            None => (StatusCode::NOT_FOUND, "Group not found").into_response(),
        },
        Err(e) => map_service_error("Failed to toggle task", e),
    }
}
