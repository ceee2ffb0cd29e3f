use crate::domain::commands::user::UpdateProfileCommand;
use crate::domain::models::user::User as DomainUser;
use shared::{UpdateProfileRequest, User as SharedUser};

/// Mapper to convert between shared User DTOs and the domain User model.
pub struct UserMapper;

impl UserMapper {
    /// Converts a domain User model to a shared User DTO.
    pub fn to_dto(domain: DomainUser) -> SharedUser {
        SharedUser {
            id: domain.id,
            username: domain.username,
            email: domain.email,
            avatar_image: domain.avatar_image,
            created_at: domain.created_at.to_rfc3339(),
            updated_at: domain.updated_at.to_rfc3339(),
        }
    }

    pub fn to_update_command(request: UpdateProfileRequest) -> UpdateProfileCommand {
        UpdateProfileCommand {
            username: request.username,
            email: request.email,
            avatar_image: request.avatar_image,
        }
    }
}
