use anyhow::Result;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::domain::aggregation_service::color_for;
use crate::domain::commands::group::{
    CreateGroupCommand, CreateGroupResult, JoinGroupCommand, JoinGroupResult, ListGroupsResult,
    ToggleTaskCompleteCommand, ToggleTaskCompleteResult, UpdateGroupCommand,
};
use crate::domain::commands::worklog::{AddWorkLogCommand, AddWorkLogResult};
use crate::domain::errors::DomainError;
use crate::domain::models::group::{
    generate_unique_code, Group, Member, Task, WorkLog, INVITED_MEMBER_PREFIX,
};
use crate::domain::normalization::DEFAULT_GROUP_NAME;
use crate::domain::user_service::UserService;
use crate::storage::json::{GroupRepository, JsonConnection, SettingsRepository};
use crate::storage::traits::{GroupStorage, SettingsStorage};

/// Service for managing groups, their rosters, tasks and work logs.
#[derive(Clone)]
pub struct GroupService {
    group_repository: GroupRepository,
    settings_repository: SettingsRepository,
    user_service: UserService,
}

impl GroupService {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self {
            group_repository: GroupRepository::new(connection.clone()),
            settings_repository: SettingsRepository::new(connection.clone()),
            user_service: UserService::new(connection),
        }
    }

    /// Create a new group with a unique join code and the current user as its
    /// first member. Invite labels become placeholder roster entries. The new
    /// group becomes the active one.
    pub fn create_group(&self, command: CreateGroupCommand) -> Result<CreateGroupResult> {
        let user = self.user_service.get_or_create_user()?;
        let mut groups = self.group_repository.load_groups()?;
        let now = Utc::now();

        let mut rng = rand::thread_rng();
        let code = generate_unique_code(&mut rng, |c| groups.iter().any(|g| g.code == c));

        let mut members = vec![Member {
            user_id: user.id.clone(),
            username: user.username.clone(),
            avatar_image: user.avatar_image.clone(),
            joined_at: now,
        }];
        for (idx, label) in command.invited.iter().enumerate() {
            let label = label.trim();
            if label.is_empty() {
                continue;
            }
            members.push(Member {
                user_id: format!("{}{}_{}", INVITED_MEMBER_PREFIX, code, idx),
                username: label.to_string(),
                avatar_image: String::new(),
                joined_at: now,
            });
        }

        let name = command.name.trim();
        let group = Group {
            id: code.clone(),
            code,
            name: if name.is_empty() {
                DEFAULT_GROUP_NAME.to_string()
            } else {
                name.to_string()
            },
            description: command.description.trim().to_string(),
            banner_image: command.banner_image,
            members,
            tasks: Vec::new(),
            events: Vec::new(),
            completed_task_ids: Default::default(),
            created_by: user.id,
            created_at: now,
            updated_at: now,
        };

        // newest group first, matching the dashboard ordering
        groups.insert(0, group.clone());
        self.group_repository.save_groups(&groups)?;
        self.settings_repository
            .set_current_group_id(Some(&group.id))?;

        info!("Created group {} ({})", group.name, group.code);
        Ok(CreateGroupResult { group })
    }

    /// Join a group by its code. The code is canonicalized before lookup;
    /// on success the current user is upserted into the roster and the group
    /// becomes active. Fails with [`DomainError::GroupNotFound`] without
    /// touching any stored group.
    pub fn join_group_by_code(&self, command: JoinGroupCommand) -> Result<JoinGroupResult> {
        let code = shared::normalize_group_code(&command.code);
        let user = self.user_service.get_or_create_user()?;
        let mut groups = self.group_repository.load_groups()?;
        let now = Utc::now();

        let group = groups
            .iter_mut()
            .find(|g| g.code == code)
            .ok_or_else(|| {
                warn!("Join failed, no group with code {:?}", code);
                DomainError::GroupNotFound(code.clone())
            })?;

        let display_name = command
            .display_name_override
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(&user.username)
            .to_string();

        if let Some(member) = group.find_member_mut(&user.id) {
            member.username = display_name;
            if !user.avatar_image.is_empty() {
                member.avatar_image = user.avatar_image.clone();
            }
            debug!("Refreshed existing membership for {}", user.id);
        } else {
            group.members.insert(
                0,
                Member {
                    user_id: user.id.clone(),
                    username: display_name,
                    avatar_image: user.avatar_image.clone(),
                    joined_at: now,
                },
            );
        }
        group.updated_at = now;

        let joined = group.clone();
        self.group_repository.save_groups(&groups)?;
        self.settings_repository
            .set_current_group_id(Some(&joined.id))?;

        info!("User {} joined group {}", user.id, joined.code);
        Ok(JoinGroupResult { group: joined })
    }

    /// Partial update of group metadata. Returns `None` when the id is
    /// unknown.
    pub fn update_group(&self, command: UpdateGroupCommand) -> Result<Option<Group>> {
        let mut groups = self.group_repository.load_groups()?;

        let Some(group) = groups.iter_mut().find(|g| g.id == command.group_id) else {
            warn!("Update for unknown group {}", command.group_id);
            return Ok(None);
        };

        if let Some(name) = command.name {
            let name = name.trim();
            if !name.is_empty() {
                group.name = name.to_string();
            }
        }
        if let Some(description) = command.description {
            group.description = description.trim().to_string();
        }
        if let Some(banner_image) = command.banner_image {
            group.banner_image = banner_image;
        }
        if let Some(invited) = command.invited {
            // invited labels fully replace the previous placeholders; joined
            // members are untouched
            let code = group.code.clone();
            let now = Utc::now();
            group.members.retain(|m| !m.is_invited_placeholder());
            for (idx, label) in invited.iter().enumerate() {
                let label = label.trim();
                if label.is_empty() {
                    continue;
                }
                group.members.push(Member {
                    user_id: format!("{}{}_{}", INVITED_MEMBER_PREFIX, code, idx),
                    username: label.to_string(),
                    avatar_image: String::new(),
                    joined_at: now,
                });
            }
        }
        group.updated_at = Utc::now();

        let updated = group.clone();
        self.group_repository.save_groups(&groups)?;
        info!("Updated group {}", updated.id);
        Ok(Some(updated))
    }

    /// Flip a task's membership in the group's completed set. No-op when the
    /// group is unknown.
    pub fn toggle_task_complete(
        &self,
        command: ToggleTaskCompleteCommand,
    ) -> Result<ToggleTaskCompleteResult> {
        let mut groups = self.group_repository.load_groups()?;

        let Some(group) = groups.iter_mut().find(|g| g.id == command.group_id) else {
            debug!("Toggle for unknown group {}, ignoring", command.group_id);
            return Ok(ToggleTaskCompleteResult {
                now_completed: None,
            });
        };

        let now_completed = if group.completed_task_ids.remove(&command.task_id) {
            false
        } else {
            group.completed_task_ids.insert(command.task_id.clone());
            true
        };
        group.updated_at = Utc::now();

        self.group_repository.save_groups(&groups)?;
        debug!(
            "Task {} in group {} now completed={}",
            command.task_id, command.group_id, now_completed
        );
        Ok(ToggleTaskCompleteResult {
            now_completed: Some(now_completed),
        })
    }

    /// Append a work log event. Validates the duration and resolves the task
    /// from an existing id or a (possibly new) name; the acting user is
    /// upserted into the roster so their total renders immediately.
    pub fn add_work_log(&self, command: AddWorkLogCommand) -> Result<AddWorkLogResult> {
        if command.minutes == 0 {
            return Err(DomainError::InvalidMinutes(command.minutes).into());
        }

        let user = self.user_service.get_or_create_user()?;
        let mut groups = self.group_repository.load_groups()?;
        let now = Utc::now();

        let group = groups
            .iter_mut()
            .find(|g| g.id == command.group_id)
            .ok_or_else(|| DomainError::GroupNotFound(command.group_id.clone()))?;

        let task = resolve_task(group, &command.task_id, &command.task_name, now)?;

        let event = WorkLog {
            id: unique_log_id(group, now),
            task_id: task.id.clone(),
            task_name: task.name.clone(),
            description: command.description.trim().to_string(),
            minutes: command.minutes,
            stars: command.stars.clamp(1, 5),
            photo_image: command.photo_image,
            user_id: user.id.clone(),
            user_name: user.username.clone(),
            created_at: now,
        };
        group.events.push(event.clone());

        if group.find_member(&user.id).is_none() {
            group.members.insert(
                0,
                Member {
                    user_id: user.id.clone(),
                    username: user.username.clone(),
                    avatar_image: user.avatar_image.clone(),
                    joined_at: now,
                },
            );
        }
        group.updated_at = now;

        self.group_repository.save_groups(&groups)?;
        info!(
            "Logged {} min on {:?} in group {}",
            event.minutes, event.task_name, command.group_id
        );
        Ok(AddWorkLogResult { event, task })
    }

    /// All locally known groups plus the active-group pointer.
    pub fn list_groups(&self) -> Result<ListGroupsResult> {
        let groups = self.group_repository.load_groups()?;
        let current_group_id = self.settings_repository.get_current_group_id()?;
        Ok(ListGroupsResult {
            groups,
            current_group_id,
        })
    }

    pub fn get_group(&self, group_id: &str) -> Result<Option<Group>> {
        let groups = self.group_repository.load_groups()?;
        Ok(groups.into_iter().find(|g| g.id == group_id))
    }

    /// Point the UI at a group. Fails with [`DomainError::GroupNotFound`]
    /// for unknown ids.
    pub fn set_current_group(&self, group_id: &str) -> Result<()> {
        if self.get_group(group_id)?.is_none() {
            return Err(DomainError::GroupNotFound(group_id.to_string()).into());
        }
        self.settings_repository.set_current_group_id(Some(group_id))
    }

    /// The currently active group, if the pointer is set and still valid.
    pub fn current_group(&self) -> Result<Option<Group>> {
        let Some(id) = self.settings_repository.get_current_group_id()? else {
            return Ok(None);
        };
        self.get_group(&id)
    }
}

/// Find the task the log refers to, creating it when a new name is supplied.
fn resolve_task(
    group: &mut Group,
    task_id: &str,
    task_name: &str,
    now: DateTime<Utc>,
) -> Result<Task> {
    if !task_id.is_empty() {
        if let Some(task) = group.find_task(task_id) {
            return Ok(task.clone());
        }
        debug!("Work log referenced unknown task id {:?}", task_id);
    }

    let name = task_name.trim();
    if name.is_empty() {
        return Err(DomainError::MissingTask.into());
    }

    if let Some(task) = group.find_task_by_name(name) {
        return Ok(task.clone());
    }

    let mut millis = now.timestamp_millis() as u64;
    // same-millisecond creations get distinct ids
    while group.tasks.iter().any(|t| t.id == shared::Task::generate_id(millis)) {
        millis += 1;
    }
    let id = shared::Task::generate_id(millis);
    let task = Task {
        color_index: color_for(&id),
        id,
        name: name.to_string(),
        created_at: now,
    };
    group.tasks.push(task.clone());
    info!("Auto-created task {:?} in group {}", task.name, group.code);
    Ok(task)
}

fn unique_log_id(group: &Group, now: DateTime<Utc>) -> String {
    let mut millis = now.timestamp_millis() as u64;
    while group
        .events
        .iter()
        .any(|e| e.id == shared::WorkLog::generate_id(millis))
    {
        millis += 1;
    }
    shared::WorkLog::generate_id(millis)
}
