//! Domain-level command and query types.
//!
//! These structs are used by services inside the domain layer and are **not**
//! exposed over the public API. The REST layer maps the public DTOs defined
//! in the `shared` crate to these internal types.

pub mod user {
    use crate::domain::models::user::User;

    /// Partial profile update; `None` fields are left untouched.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateProfileCommand {
        pub username: Option<String>,
        pub email: Option<String>,
        pub avatar_image: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct UpdateProfileResult {
        pub user: User,
        /// How many group roster entries were rewritten by the cascade
        pub cascaded_members: usize,
    }
}

pub mod group {
    use crate::domain::models::group::Group;

    /// Input for creating a new group.
    #[derive(Debug, Clone)]
    pub struct CreateGroupCommand {
        pub name: String,
        pub description: String,
        pub banner_image: String,
        /// Display labels for invite placeholder members
        pub invited: Vec<String>,
    }

    /// Input for joining an existing group by code.
    #[derive(Debug, Clone)]
    pub struct JoinGroupCommand {
        /// Raw user input; normalized before lookup
        pub code: String,
        pub display_name_override: Option<String>,
    }

    /// Partial metadata update for a group.
    #[derive(Debug, Clone, Default)]
    pub struct UpdateGroupCommand {
        pub group_id: String,
        pub name: Option<String>,
        pub description: Option<String>,
        pub banner_image: Option<String>,
        pub invited: Option<Vec<String>>,
    }

    #[derive(Debug, Clone)]
    pub struct ToggleTaskCompleteCommand {
        pub group_id: String,
        pub task_id: String,
    }

    #[derive(Debug, Clone)]
    pub struct CreateGroupResult {
        pub group: Group,
    }

    #[derive(Debug, Clone)]
    pub struct JoinGroupResult {
        pub group: Group,
    }

    #[derive(Debug, Clone)]
    pub struct ListGroupsResult {
        pub groups: Vec<Group>,
        pub current_group_id: Option<String>,
    }

    #[derive(Debug, Clone)]
    pub struct ToggleTaskCompleteResult {
        /// Completion state of the task after the toggle; `None` when the
        /// group was unknown and nothing changed
        pub now_completed: Option<bool>,
    }
}

pub mod worklog {
    use crate::domain::models::group::{Task, WorkLog};

    /// Input for logging work against a task.
    #[derive(Debug, Clone)]
    pub struct AddWorkLogCommand {
        pub group_id: String,
        /// Existing task id; empty means `task_name` names the task
        pub task_id: String,
        /// Free-text task name, auto-creates the task on first use
        pub task_name: String,
        pub description: String,
        pub minutes: u32,
        pub stars: u8,
        pub photo_image: String,
    }

    #[derive(Debug, Clone)]
    pub struct AddWorkLogResult {
        pub event: WorkLog,
        /// The task the log was attached to (possibly newly created)
        pub task: Task,
    }
}
