//! Storage abstraction traits.
//!
//! The domain layer talks to persistence only through these traits, so the
//! JSON file store can be swapped for any other backend without touching the
//! services. All operations are synchronous; documents are small.

use anyhow::Result;

use crate::domain::models::group::Group;
use crate::domain::models::user::User;

/// Interface for the single local user record.
pub trait UserStorage: Send + Sync {
    /// Load the persisted user, `None` when no profile exists yet
    fn load_user(&self) -> Result<Option<User>>;

    /// Persist the user record
    fn save_user(&self, user: &User) -> Result<()>;
}

/// Interface for the locally known group documents.
///
/// Groups are loaded and stored as a whole list, matching the persisted
/// format (one `groups` document). Every load passes through the
/// normalization routine, so callers always see canonical records.
pub trait GroupStorage: Send + Sync {
    /// Load all groups, normalized
    fn load_groups(&self) -> Result<Vec<Group>>;

    /// Persist the full group list
    fn save_groups(&self, groups: &[Group]) -> Result<()>;
}

/// Interface for small installation-wide settings.
pub trait SettingsStorage: Send + Sync {
    /// Id of the group currently shown in the UI
    fn get_current_group_id(&self) -> Result<Option<String>>;

    /// Set (or clear) the current group pointer
    fn set_current_group_id(&self, group_id: Option<&str>) -> Result<()>;
}
