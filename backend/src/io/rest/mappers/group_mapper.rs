use crate::domain::commands::group::{CreateGroupCommand, JoinGroupCommand, UpdateGroupCommand};
use crate::domain::models::group::{Group as DomainGroup, Member as DomainMember};
use shared::{
    CreateGroupRequest, Group as SharedGroup, JoinGroupRequest, Member as SharedMember,
    UpdateGroupRequest,
};

use super::worklog_mapper::WorkLogMapper;

/// Mapper to convert between shared Group DTOs and domain Group models.
pub struct GroupMapper;

impl GroupMapper {
    /// Converts a domain Group model to a shared Group DTO.
    pub fn to_dto(domain: DomainGroup) -> SharedGroup {
        SharedGroup {
            id: domain.id,
            code: domain.code,
            name: domain.name,
            description: domain.description,
            banner_image: domain.banner_image,
            members: domain.members.into_iter().map(Self::member_to_dto).collect(),
            tasks: domain
                .tasks
                .into_iter()
                .map(WorkLogMapper::task_to_dto)
                .collect(),
            events: domain
                .events
                .into_iter()
                .map(WorkLogMapper::to_dto)
                .collect(),
            completed_task_ids: domain.completed_task_ids.into_iter().collect(),
            created_by: domain.created_by,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn member_to_dto(domain: DomainMember) -> SharedMember {
        SharedMember {
            user_id: domain.user_id,
            username: domain.username,
            avatar_image: domain.avatar_image,
            joined_at: domain.joined_at.to_rfc3339(),
        }
    }

    pub fn to_create_command(request: CreateGroupRequest) -> CreateGroupCommand {
        CreateGroupCommand {
            name: request.name,
            description: request.description.unwrap_or_default(),
            banner_image: request.banner_image.unwrap_or_default(),
            invited: request.invited,
        }
    }

    pub fn to_join_command(request: JoinGroupRequest) -> JoinGroupCommand {
        JoinGroupCommand {
            code: request.code,
            display_name_override: request.display_name,
        }
    }

    pub fn to_update_command(group_id: &str, request: UpdateGroupRequest) -> UpdateGroupCommand {
        UpdateGroupCommand {
            group_id: group_id.to_string(),
            name: request.name,
            description: request.description,
            banner_image: request.banner_image,
            invited: request.invited,
        }
    }
}
