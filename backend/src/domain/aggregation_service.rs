//! Aggregation over a group's event log.
//!
//! Everything here is a pure function of the group: totals are recomputed
//! from scratch on every call and nothing is cached, so there is never a
//! stale-aggregate bug. Event logs are small enough that this trade is free.

use std::collections::HashMap;

use shared::TASK_COLOR_SLOTS;

use crate::domain::models::group::{Group, WorkLog};

/// Key for a per-task bucket. Events whose task was deleted after logging
/// (or that predate first-class tasks) fall into the `Other` bucket keyed by
/// their free-text subject snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TaskKey {
    Todo(String),
    Other(String),
}

impl std::fmt::Display for TaskKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TaskKey::Todo(id) => write!(f, "todo:{}", id),
            TaskKey::Other(subject) => write!(f, "other:{}", subject),
        }
    }
}

/// One row of a per-task breakdown.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskMinutes {
    pub task_id: String,
    pub task_name: String,
    pub minutes: u64,
}

fn key_for(group: &Group, event: &WorkLog) -> TaskKey {
    if !event.task_id.is_empty() && group.find_task(&event.task_id).is_some() {
        TaskKey::Todo(event.task_id.clone())
    } else {
        TaskKey::Other(event.task_name.clone())
    }
}

/// Total minutes per member. Members with no events still appear with 0, so
/// a freshly joined member shows up on the dashboard immediately.
pub fn total_minutes_by_member(group: &Group) -> HashMap<String, u64> {
    let mut totals: HashMap<String, u64> = group
        .members
        .iter()
        .map(|m| (m.user_id.clone(), 0))
        .collect();
    for event in &group.events {
        *totals.entry(event.user_id.clone()).or_insert(0) += u64::from(event.minutes);
    }
    totals
}

/// Member totals ordered descending by minutes, for bar-chart rendering.
/// The username comes from the live roster when present, falling back to the
/// event snapshot for users no longer on it.
pub fn member_totals_sorted(group: &Group) -> Vec<(String, String, u64)> {
    let totals = total_minutes_by_member(group);
    let mut rows: Vec<(String, String, u64)> = totals
        .into_iter()
        .map(|(user_id, minutes)| {
            let username = group
                .find_member(&user_id)
                .map(|m| m.username.clone())
                .or_else(|| {
                    group
                        .events
                        .iter()
                        .find(|e| e.user_id == user_id && !e.user_name.is_empty())
                        .map(|e| e.user_name.clone())
                })
                .unwrap_or_else(|| "Member".to_string());
            (user_id, username, minutes)
        })
        .collect();
    rows.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
    rows
}

/// Minutes per member, split by task key.
pub fn total_minutes_by_member_and_task(group: &Group) -> HashMap<String, HashMap<TaskKey, u64>> {
    let mut totals: HashMap<String, HashMap<TaskKey, u64>> = HashMap::new();
    for event in &group.events {
        let per_task = totals.entry(event.user_id.clone()).or_default();
        *per_task.entry(key_for(group, event)).or_insert(0) += u64::from(event.minutes);
    }
    totals
}

/// Per-task minutes for one user, ordered descending by minutes; ties keep
/// the order in which the task first appears in the event log.
pub fn total_minutes_by_task_for_user(group: &Group, user_id: &str) -> Vec<TaskMinutes> {
    let mut rows: Vec<(TaskKey, TaskMinutes)> = Vec::new();
    for event in group.events.iter().filter(|e| e.user_id == user_id) {
        accumulate(group, &mut rows, event);
    }
    finish_rows(rows)
}

/// Group-wide per-task minutes (the pie/donut aggregate over all members).
pub fn total_minutes_by_task(group: &Group) -> Vec<TaskMinutes> {
    let mut rows: Vec<(TaskKey, TaskMinutes)> = Vec::new();
    for event in &group.events {
        accumulate(group, &mut rows, event);
    }
    finish_rows(rows)
}

fn accumulate(group: &Group, rows: &mut Vec<(TaskKey, TaskMinutes)>, event: &WorkLog) {
    let key = key_for(group, event);
    if let Some((_, row)) = rows.iter_mut().find(|(k, _)| *k == key) {
        row.minutes += u64::from(event.minutes);
        return;
    }
    let (task_id, task_name) = match &key {
        // live name for resolvable tasks so renames show through
        TaskKey::Todo(id) => {
            let name = group
                .find_task(id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| event.task_name.clone());
            (id.clone(), name)
        }
        TaskKey::Other(subject) => (String::new(), subject.clone()),
    };
    rows.push((
        key,
        TaskMinutes {
            task_id,
            task_name,
            minutes: u64::from(event.minutes),
        },
    ));
}

fn finish_rows(rows: Vec<(TaskKey, TaskMinutes)>) -> Vec<TaskMinutes> {
    let mut out: Vec<TaskMinutes> = rows.into_iter().map(|(_, row)| row).collect();
    // stable sort keeps first-occurrence order for equal minute counts
    out.sort_by(|a, b| b.minutes.cmp(&a.minutes));
    out
}

/// The most recent work logs, newest first.
pub fn recent_logs(group: &Group, limit: usize) -> Vec<&WorkLog> {
    let mut logs: Vec<&WorkLog> = group.events.iter().collect();
    logs.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    logs.truncate(limit);
    logs
}

/// Deterministic palette slot for an id: FNV-1a over the bytes, mod the
/// palette size. Stable across runs so chart segments keep their colors.
pub fn color_for(id: &str) -> u8 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for byte in id.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    (hash % u64::from(TASK_COLOR_SLOTS)) as u8
}
