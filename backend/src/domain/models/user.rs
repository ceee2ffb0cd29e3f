use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Display name used until the user picks one
pub const DEFAULT_USERNAME: &str = "Guest";

/// The single local user of this installation (domain model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    pub avatar_image: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a brand-new user with a freshly generated id and defaults.
    pub fn new_default(now: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: DEFAULT_USERNAME.to_string(),
            email: String::new(),
            avatar_image: String::new(),
            created_at: now,
            updated_at: now,
        }
    }
}
