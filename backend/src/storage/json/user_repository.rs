use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

use super::connection::JsonConnection;
use crate::domain::errors::DomainError;
use crate::domain::models::user::{User, DEFAULT_USERNAME};
use crate::storage::traits::UserStorage;

const USER_FILE: &str = "user.json";

/// Persisted user record, tolerant of the older camelCase shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct RawUser {
    #[serde(default, alias = "userId")]
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    email: String,
    #[serde(default, alias = "photoDataUrl", alias = "avatarImage")]
    avatar_image: String,
    #[serde(default, alias = "createdAt")]
    created_at: String,
    #[serde(default, alias = "updatedAt")]
    updated_at: String,
}

/// File-backed user repository (`user.json` in the data directory).
#[derive(Clone)]
pub struct UserRepository {
    connection: Arc<JsonConnection>,
}

impl UserRepository {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self { connection }
    }

    fn user_path(&self) -> std::path::PathBuf {
        self.connection.base_directory().join(USER_FILE)
    }

    fn parse_time(raw: &str, now: DateTime<Utc>) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(raw)
            .map(|dt| dt.with_timezone(&Utc))
            .unwrap_or(now)
    }
}

impl UserStorage for UserRepository {
    fn load_user(&self) -> Result<Option<User>> {
        let path = self.user_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = fs::read_to_string(&path)?;
        let raw: RawUser = match serde_json::from_str(&contents) {
            Ok(raw) => raw,
            Err(e) => {
                // corrupt profile is recovered by starting over, never propagated
                let parse = DomainError::Parse {
                    document: USER_FILE.to_string(),
                    message: e.to_string(),
                };
                warn!("{}; treating profile as absent", parse);
                return Ok(None);
            }
        };

        if raw.id.is_empty() {
            warn!("User document has no id, treating as absent");
            return Ok(None);
        }

        let now = Utc::now();
        Ok(Some(User {
            id: raw.id,
            username: if raw.username.trim().is_empty() {
                DEFAULT_USERNAME.to_string()
            } else {
                raw.username
            },
            email: raw.email,
            avatar_image: raw.avatar_image,
            created_at: Self::parse_time(&raw.created_at, now),
            updated_at: Self::parse_time(&raw.updated_at, now),
        }))
    }

    fn save_user(&self, user: &User) -> Result<()> {
        let raw = RawUser {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            avatar_image: user.avatar_image.clone(),
            created_at: user.created_at.to_rfc3339(),
            updated_at: user.updated_at.to_rfc3339(),
        };
        let contents = serde_json::to_string_pretty(&raw)?;
        self.connection.write_atomic(&self.user_path(), &contents)?;
        info!("Saved user {}", user.id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn setup() -> (UserRepository, TempDir) {
        let temp = TempDir::new().unwrap();
        let conn = JsonConnection::new(temp.path()).unwrap();
        (UserRepository::new(Arc::new(conn)), temp)
    }

    #[test]
    fn test_load_absent_user() {
        let (repo, _temp) = setup();
        assert!(repo.load_user().unwrap().is_none());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (repo, _temp) = setup();
        let user = User::new_default(Utc::now());
        repo.save_user(&user).unwrap();

        let loaded = repo.load_user().unwrap().unwrap();
        assert_eq!(loaded.id, user.id);
        assert_eq!(loaded.username, DEFAULT_USERNAME);
    }

    #[test]
    fn test_corrupt_user_file_recovered_as_none() {
        let (repo, temp) = setup();
        fs::write(temp.path().join(USER_FILE), "{not json").unwrap();
        assert!(repo.load_user().unwrap().is_none());
    }

    #[test]
    fn test_legacy_camel_case_shape_accepted() {
        let (repo, temp) = setup();
        fs::write(
            temp.path().join(USER_FILE),
            r#"{"userId":"u-1","username":"Ada","photoDataUrl":"data:x"}"#,
        )
        .unwrap();

        let loaded = repo.load_user().unwrap().unwrap();
        assert_eq!(loaded.id, "u-1");
        assert_eq!(loaded.username, "Ada");
        assert_eq!(loaded.avatar_image, "data:x");
    }
}
