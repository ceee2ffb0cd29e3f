use serde::{Deserialize, Serialize};
use std::fmt;

/// The single local user of this installation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Data-URL encoded avatar image, empty when unset
    pub avatar_image: String,
    /// RFC 3339 timestamp
    pub created_at: String,
    /// RFC 3339 timestamp
    pub updated_at: String,
}

/// A shared tracking workspace identified by a join code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    /// 6-character uppercase alphanumeric join code, unique per installation
    pub code: String,
    pub name: String,
    pub description: String,
    /// Data-URL encoded banner image, empty when unset
    pub banner_image: String,
    pub members: Vec<Member>,
    pub tasks: Vec<Task>,
    pub events: Vec<WorkLog>,
    /// Ids of tasks the group has marked done
    pub completed_task_ids: Vec<String>,
    pub created_by: String,
    pub created_at: String,
    pub updated_at: String,
}

/// A user's membership record within a specific group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub username: String,
    pub avatar_image: String,
    /// RFC 3339 timestamp of when the member joined
    pub joined_at: String,
}

/// A named unit of work that time can be logged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Task ID in format: "task::<epoch_millis>"
    pub id: String,
    pub name: String,
    pub created_at: String,
    /// Chart tag color slot (0-3), clamped to range on read
    pub color_index: u8,
}

/// An immutable record of minutes spent by a member on a task.
///
/// `task_name` and `user_name` are display snapshots captured at creation
/// time; `task_id` and `user_id` are the live references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLog {
    /// Work log ID in format: "log::<epoch_millis>"
    pub id: String,
    pub task_id: String,
    pub task_name: String,
    pub description: String,
    /// Minutes spent, always > 0
    pub minutes: u32,
    /// Self-rated difficulty (1-5)
    pub stars: u8,
    /// Data-URL encoded photo, empty when unset
    pub photo_image: String,
    pub user_id: String,
    pub user_name: String,
    pub created_at: String,
}

/// Request for updating the local user profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateProfileRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub avatar_image: Option<String>,
}

/// Response after updating the profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateProfileResponse {
    pub user: User,
    pub success_message: String,
}

/// Request for creating a new group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGroupRequest {
    pub name: String,
    pub description: Option<String>,
    pub banner_image: Option<String>,
    /// Display labels for people invited before they join
    #[serde(default)]
    pub invited: Vec<String>,
}

/// Response after creating a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateGroupResponse {
    pub group: Group,
    pub success_message: String,
}

/// Request for joining a group by its code
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinGroupRequest {
    pub code: String,
    /// Optional display name to use inside this group
    pub display_name: Option<String>,
}

/// Response after joining a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JoinGroupResponse {
    pub group: Group,
    pub success_message: String,
}

/// Request for a partial update of group metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UpdateGroupRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub banner_image: Option<String>,
    pub invited: Option<Vec<String>>,
}

/// Response containing a list of groups
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupListResponse {
    pub groups: Vec<Group>,
    pub current_group_id: Option<String>,
}

/// Request for logging work against a task
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddWorkLogRequest {
    /// Existing task id; empty or None means `task_name` names the task
    pub task_id: Option<String>,
    /// Free-text task name, auto-creates the task on first use
    pub task_name: Option<String>,
    pub description: Option<String>,
    pub minutes: u32,
    pub stars: Option<u8>,
    pub photo_image: Option<String>,
}

/// Response after logging work
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AddWorkLogResponse {
    pub event: WorkLog,
    /// The task the log was attached to (possibly newly created)
    pub task: Task,
    pub success_message: String,
}

/// One member's total in a group report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MemberTotal {
    pub user_id: String,
    pub username: String,
    pub minutes: u64,
}

/// One task's total in a group report
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskTotal {
    pub task_id: String,
    pub task_name: String,
    pub minutes: u64,
    /// Palette slot for chart segments
    pub color_index: u8,
}

/// Per-task breakdown for a single user, ordered by minutes descending
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserTaskBreakdown {
    pub user_id: String,
    pub total_minutes: u64,
    pub formatted_total: String,
    pub tasks: Vec<TaskTotal>,
}

/// Aggregated report for a group
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupReportResponse {
    pub group_id: String,
    pub member_totals: Vec<MemberTotal>,
    pub task_totals: Vec<TaskTotal>,
    pub user_breakdowns: Vec<UserTaskBreakdown>,
    pub recent_logs: Vec<WorkLog>,
}

/// Response after toggling a task's completed state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToggleTaskResponse {
    pub task_id: String,
    /// Completion state after the toggle
    pub completed: bool,
}

impl WorkLog {
    /// Generate a work log ID from a timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("log::{}", epoch_millis)
    }

    /// Parse a work log ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, RecordIdError> {
        parse_prefixed_id(id, "log")
    }

    /// Extract epoch timestamp from this log's ID for sorting
    pub fn extract_timestamp(&self) -> Result<u64, RecordIdError> {
        Self::parse_id(&self.id)
    }
}

impl Task {
    /// Generate a task ID from a timestamp
    pub fn generate_id(epoch_millis: u64) -> String {
        format!("task::{}", epoch_millis)
    }

    /// Parse a task ID to extract the timestamp
    pub fn parse_id(id: &str) -> Result<u64, RecordIdError> {
        parse_prefixed_id(id, "task")
    }
}

fn parse_prefixed_id(id: &str, prefix: &str) -> Result<u64, RecordIdError> {
    let parts: Vec<&str> = id.split("::").collect();
    if parts.len() != 2 || parts[0] != prefix {
        return Err(RecordIdError::InvalidFormat);
    }
    parts[1]
        .parse::<u64>()
        .map_err(|_| RecordIdError::InvalidTimestamp)
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordIdError {
    InvalidFormat,
    InvalidTimestamp,
}

impl fmt::Display for RecordIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordIdError::InvalidFormat => write!(f, "Invalid record ID format"),
            RecordIdError::InvalidTimestamp => write!(f, "Invalid timestamp in record ID"),
        }
    }
}

impl std::error::Error for RecordIdError {}

/// Number of palette slots available for task chart tags
pub const TASK_COLOR_SLOTS: u8 = 4;

/// Canonicalize user-supplied group code input (form field or URL query):
/// uppercase, strip everything outside A-Z0-9, cap at 12 characters.
pub fn normalize_group_code(input: &str) -> String {
    input
        .trim()
        .to_uppercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(12)
        .collect()
}

/// A stored group code is exactly 6 uppercase alphanumeric characters.
pub fn is_valid_group_code(code: &str) -> bool {
    code.len() == 6
        && code
            .chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
}

/// Format a minute count for display, e.g. "2h 15m" or "45m".
pub fn format_minutes(minutes: u64) -> String {
    let h = minutes / 60;
    let m = minutes % 60;
    if h > 0 {
        format!("{}h {}m", h, m)
    } else {
        format!("{}m", m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_work_log_id() {
        assert_eq!(WorkLog::generate_id(1702516122000), "log::1702516122000");
    }

    #[test]
    fn test_parse_work_log_id() {
        assert_eq!(
            WorkLog::parse_id("log::1702516122000").unwrap(),
            1702516122000
        );

        assert!(WorkLog::parse_id("log").is_err());
        assert!(WorkLog::parse_id("task::1702516122000").is_err());
        assert!(WorkLog::parse_id("log::not_a_number").is_err());
        assert!(WorkLog::parse_id("log::123::456").is_err());
    }

    #[test]
    fn test_generate_task_id() {
        assert_eq!(Task::generate_id(1702516122000), "task::1702516122000");
    }

    #[test]
    fn test_parse_task_id() {
        assert_eq!(
            Task::parse_id("task::1702516122000").unwrap(),
            1702516122000
        );
        assert!(Task::parse_id("log::1702516122000").is_err());
        assert!(Task::parse_id("task::").is_err());
    }

    #[test]
    fn test_extract_timestamp() {
        let log = WorkLog {
            id: "log::1702516122000".to_string(),
            task_id: "task::1702516000000".to_string(),
            task_name: "Design".to_string(),
            description: String::new(),
            minutes: 60,
            stars: 3,
            photo_image: String::new(),
            user_id: "user-a".to_string(),
            user_name: "Alice".to_string(),
            created_at: "2023-12-14T01:02:02.000Z".to_string(),
        };
        assert_eq!(log.extract_timestamp().unwrap(), 1702516122000);
    }

    #[test]
    fn test_normalize_group_code() {
        assert_eq!(normalize_group_code("  ab c123 "), "ABC123");
        assert_eq!(normalize_group_code("ab-c1.23"), "ABC123");
        assert_eq!(normalize_group_code("abcdefghijklmnop"), "ABCDEFGHIJKL");
        assert_eq!(normalize_group_code(""), "");
    }

    #[test]
    fn test_is_valid_group_code() {
        assert!(is_valid_group_code("ABC123"));
        assert!(is_valid_group_code("ZZZZZZ"));
        assert!(!is_valid_group_code("abc123")); // lowercase
        assert!(!is_valid_group_code("ABC12")); // too short
        assert!(!is_valid_group_code("ABC1234")); // too long
        assert!(!is_valid_group_code("ABC-12")); // punctuation
        assert!(!is_valid_group_code(""));
    }

    #[test]
    fn test_format_minutes() {
        assert_eq!(format_minutes(0), "0m");
        assert_eq!(format_minutes(45), "45m");
        assert_eq!(format_minutes(60), "1h 0m");
        assert_eq!(format_minutes(135), "2h 15m");
    }
}
