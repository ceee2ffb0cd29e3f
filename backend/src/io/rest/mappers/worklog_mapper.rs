use crate::domain::commands::worklog::AddWorkLogCommand;
use crate::domain::models::group::{Task as DomainTask, WorkLog as DomainWorkLog};
use shared::{AddWorkLogRequest, Task as SharedTask, WorkLog as SharedWorkLog};

/// Default difficulty rating when the request omits one
const DEFAULT_STARS: u8 = 3;

/// Mapper to convert between shared work log DTOs and domain models.
pub struct WorkLogMapper;

impl WorkLogMapper {
    /// Converts a domain WorkLog model to a shared WorkLog DTO.
    pub fn to_dto(domain: DomainWorkLog) -> SharedWorkLog {
        SharedWorkLog {
            id: domain.id,
            task_id: domain.task_id,
            task_name: domain.task_name,
            description: domain.description,
            minutes: domain.minutes,
            stars: domain.stars,
            photo_image: domain.photo_image,
            user_id: domain.user_id,
            user_name: domain.user_name,
            created_at: domain.created_at.to_rfc3339(),
        }
    }

    pub fn task_to_dto(domain: DomainTask) -> SharedTask {
        SharedTask {
            id: domain.id,
            name: domain.name,
            created_at: domain.created_at.to_rfc3339(),
            color_index: domain.color_index,
        }
    }

    pub fn to_add_command(group_id: &str, request: AddWorkLogRequest) -> AddWorkLogCommand {
        AddWorkLogCommand {
            group_id: group_id.to_string(),
            task_id: request.task_id.unwrap_or_default(),
            task_name: request.task_name.unwrap_or_default(),
            description: request.description.unwrap_or_default(),
            minutes: request.minutes,
            stars: request.stars.unwrap_or(DEFAULT_STARS),
            photo_image: request.photo_image.unwrap_or_default(),
        }
    }
}
