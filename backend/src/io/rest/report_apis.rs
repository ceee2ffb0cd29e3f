//! # REST API for Group Reports
//!
//! Endpoint serving the aggregated dashboard data for a group: member
//! totals, group-wide task totals, per-member breakdowns, and the recent
//! log feed. Everything is recomputed from the event log on each request.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use tracing::info;

use super::mappers::WorkLogMapper;
use super::map_service_error;
use crate::domain::aggregation_service::{
    color_for, member_totals_sorted, recent_logs, total_minutes_by_task,
    total_minutes_by_task_for_user, TaskMinutes,
};
use crate::domain::models::group::{clamp_color_index, Group};
use crate::AppState;
use shared::{format_minutes, GroupReportResponse, MemberTotal, TaskTotal, UserTaskBreakdown};

/// How many entries the recent-log feed carries
const RECENT_LOGS_LIMIT: usize = 20;

/// Get the aggregated report for a group
pub async fn get_group_report(
    State(state): State<AppState>,
    Path(group_id): Path<String>,
) -> impl IntoResponse {
    info!("GET /api/groups/{}/report", group_id);

    match state.group_service.get_group(&group_id) {
        Ok(Some(group)) => (StatusCode::OK, Json(build_report(&group))).into_response(),
        Ok(None) => (StatusCode::NOT_FOUND, "Group not found").into_response(),
        Err(e) => map_service_error("Failed to build group report", e),
    }
}

fn build_report(group: &Group) -> GroupReportResponse {
    let member_totals = member_totals_sorted(group)
        .into_iter()
        .map(|(user_id, username, minutes)| MemberTotal {
            user_id,
            username,
            minutes,
        })
        .collect();

    let task_totals = task_rows_to_dto(group, total_minutes_by_task(group));

    let user_breakdowns = group
        .members
        .iter()
        .map(|member| {
            let tasks = task_rows_to_dto(
                group,
                total_minutes_by_task_for_user(group, &member.user_id),
            );
            let total_minutes: u64 = tasks.iter().map(|t| t.minutes).sum();
            UserTaskBreakdown {
                user_id: member.user_id.clone(),
                total_minutes,
                formatted_total: format_minutes(total_minutes),
                tasks,
            }
        })
        .collect();

    let recent_logs = recent_logs(group, RECENT_LOGS_LIMIT)
        .into_iter()
        .cloned()
        .map(WorkLogMapper::to_dto)
        .collect();

    GroupReportResponse {
        group_id: group.id.clone(),
        member_totals,
        task_totals,
        user_breakdowns,
        recent_logs,
    }
}

fn task_rows_to_dto(group: &Group, rows: Vec<TaskMinutes>) -> Vec<TaskTotal> {
    rows.into_iter()
        .map(|row| {
            // live tasks keep their stored palette slot; orphaned buckets get
            // a stable hashed one
            let color_index = group
                .find_task(&row.task_id)
                .map(|t| clamp_color_index(t.color_index))
                .unwrap_or_else(|| color_for(&row.task_name));
            TaskTotal {
                task_id: row.task_id,
                task_name: row.task_name,
                minutes: row.minutes,
                color_index,
            }
        })
        .collect()
}
