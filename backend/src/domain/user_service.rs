use anyhow::Result;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, info};

use crate::domain::commands::user::{UpdateProfileCommand, UpdateProfileResult};
use crate::domain::models::user::User;
use crate::storage::json::{GroupRepository, JsonConnection, UserRepository};
use crate::storage::traits::{GroupStorage, UserStorage};

/// Identity store: owns the single local user record.
#[derive(Clone)]
pub struct UserService {
    user_repository: UserRepository,
    group_repository: GroupRepository,
}

impl UserService {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self {
            user_repository: UserRepository::new(connection.clone()),
            group_repository: GroupRepository::new(connection),
        }
    }

    /// Load the persisted user, creating and persisting a default one when
    /// none exists yet. Idempotent.
    pub fn get_or_create_user(&self) -> Result<User> {
        if let Some(user) = self.user_repository.load_user()? {
            debug!("Loaded existing user {}", user.id);
            return Ok(user);
        }

        let user = User::new_default(Utc::now());
        self.user_repository.save_user(&user)?;
        info!("Created new local user {}", user.id);
        Ok(user)
    }

    /// Merge non-`None` fields into the profile and cascade the new display
    /// name/avatar into every group roster entry for this user.
    ///
    /// Work log `user_name` snapshots are deliberately left alone: the roster
    /// is live, the log is history.
    pub fn update_profile(&self, command: UpdateProfileCommand) -> Result<UpdateProfileResult> {
        let mut user = self.get_or_create_user()?;

        if let Some(username) = command.username {
            let trimmed = username.trim();
            user.username = if trimmed.is_empty() {
                crate::domain::models::user::DEFAULT_USERNAME.to_string()
            } else {
                trimmed.to_string()
            };
        }
        if let Some(email) = command.email {
            user.email = email.trim().to_string();
        }
        if let Some(avatar_image) = command.avatar_image {
            user.avatar_image = avatar_image;
        }
        user.updated_at = Utc::now();

        self.user_repository.save_user(&user)?;

        let cascaded_members = self.cascade_into_rosters(&user)?;
        info!(
            "Updated profile for {}, cascaded to {} roster entries",
            user.id, cascaded_members
        );

        Ok(UpdateProfileResult {
            user,
            cascaded_members,
        })
    }

    fn cascade_into_rosters(&self, user: &User) -> Result<usize> {
        let mut groups = self.group_repository.load_groups()?;
        let mut changed = 0;

        for group in &mut groups {
            if let Some(member) = group.find_member_mut(&user.id) {
                if member.username != user.username || member.avatar_image != user.avatar_image {
                    member.username = user.username.clone();
                    member.avatar_image = user.avatar_image.clone();
                    changed += 1;
                }
            }
        }

        if changed > 0 {
            self.group_repository.save_groups(&groups)?;
        }
        Ok(changed)
    }
}
