//! # REST API for Work Logs
//!
//! Endpoint for appending work log events to a group.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::mappers::WorkLogMapper;
use super::map_service_error;
use crate::AppState;
use shared::{AddWorkLogRequest, AddWorkLogResponse};

/// Log minutes against a task, auto-creating the task when a new name is given
pub async fn add_work_log(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
    Json(request): Json<AddWorkLogRequest>,
) -> impl IntoResponse {
    info!(
        "POST /api/groups/{}/logs - minutes: {}",
        group_id, request.minutes
    );

    let command = WorkLogMapper::to_add_command(&group_id, request);
    match state.group_service.add_work_log(command) {
        Ok(result) => {
            let response = AddWorkLogResponse {
                event: WorkLogMapper::to_dto(result.event),
                task: WorkLogMapper::task_to_dto(result.task),
                success_message: "Work logged".to_string(),
            };
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => map_service_error("Failed to add work log", e),
    }
}
