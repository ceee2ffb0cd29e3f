use anyhow::Result;
use chrono::Utc;
use std::fs;
use std::sync::Arc;
use tracing::{info, warn};

use super::connection::JsonConnection;
use crate::domain::errors::DomainError;
use crate::domain::models::group::Group;
use crate::domain::normalization::{normalize_groups, RawGroup};
use crate::storage::traits::GroupStorage;

const GROUPS_FILE: &str = "groups.json";

/// File-backed group repository (`groups.json` in the data directory).
///
/// Loads pass every record through the normalization routine, so callers
/// always see canonical groups regardless of which schema version wrote the
/// file. Writes are atomic and honor the connection's document budget: an
/// oversized document is retried once with the large binary image fields
/// stripped before giving up.
#[derive(Clone)]
pub struct GroupRepository {
    connection: Arc<JsonConnection>,
}

impl GroupRepository {
    pub fn new(connection: Arc<JsonConnection>) -> Self {
        Self { connection }
    }

    fn groups_path(&self) -> std::path::PathBuf {
        self.connection.base_directory().join(GROUPS_FILE)
    }

    fn serialize(groups: &[Group]) -> Result<String> {
        let raws: Vec<RawGroup> = groups.iter().cloned().map(RawGroup::from).collect();
        Ok(serde_json::to_string_pretty(&raws)?)
    }

    /// Drop banner, avatar and photo images so the core data still fits.
    fn strip_images(groups: &[Group]) -> Vec<Group> {
        groups
            .iter()
            .cloned()
            .map(|mut g| {
                g.banner_image = String::new();
                for m in &mut g.members {
                    m.avatar_image = String::new();
                }
                for e in &mut g.events {
                    e.photo_image = String::new();
                }
                g
            })
            .collect()
    }
}

impl GroupStorage for GroupRepository {
    fn load_groups(&self) -> Result<Vec<Group>> {
        let path = self.groups_path();
        if !path.exists() {
            return Ok(Vec::new());
        }

        let contents = fs::read_to_string(&path)?;
        let raws: Vec<RawGroup> = match serde_json::from_str(&contents) {
            Ok(raws) => raws,
            Err(e) => {
                // corrupt store falls back to empty, never propagates
                let parse = DomainError::Parse {
                    document: GROUPS_FILE.to_string(),
                    message: e.to_string(),
                };
                warn!("{}; falling back to empty store", parse);
                return Ok(Vec::new());
            }
        };

        let mut rng = rand::thread_rng();
        Ok(normalize_groups(raws, &mut rng, Utc::now()))
    }

    fn save_groups(&self, groups: &[Group]) -> Result<()> {
        let budget = self.connection.document_budget();
        let contents = Self::serialize(groups)?;

        let contents = if contents.len() > budget {
            warn!(
                size = contents.len(),
                budget, "Groups document over budget, stripping images and retrying"
            );
            let stripped = Self::serialize(&Self::strip_images(groups))?;
            if stripped.len() > budget {
                return Err(DomainError::StorageQuotaExceeded {
                    document: GROUPS_FILE.to_string(),
                }
                .into());
            }
            stripped
        } else {
            contents
        };

        self.connection.write_atomic(&self.groups_path(), &contents)?;
        info!("Saved {} groups", groups.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::group::{Member, WorkLog};
    use chrono::TimeZone;
    use std::collections::BTreeSet;
    use tempfile::TempDir;

    fn setup() -> (GroupRepository, TempDir) {
        let temp = TempDir::new().unwrap();
        let conn = JsonConnection::new(temp.path()).unwrap();
        (GroupRepository::new(Arc::new(conn)), temp)
    }

    fn sample_group(code: &str) -> Group {
        let now = Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap();
        Group {
            id: code.to_string(),
            code: code.to_string(),
            name: "Sample".to_string(),
            description: "desc".to_string(),
            banner_image: String::new(),
            members: vec![Member {
                user_id: "u1".to_string(),
                username: "Ada".to_string(),
                avatar_image: String::new(),
                joined_at: now,
            }],
            tasks: Vec::new(),
            events: Vec::new(),
            completed_task_ids: BTreeSet::new(),
            created_by: "u1".to_string(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let (repo, _temp) = setup();
        assert!(repo.load_groups().unwrap().is_empty());
    }

    #[test]
    fn test_save_and_load_roundtrip() {
        let (repo, _temp) = setup();
        let groups = vec![sample_group("ABC123"), sample_group("XYZ789")];
        repo.save_groups(&groups).unwrap();

        let loaded = repo.load_groups().unwrap();
        assert_eq!(loaded, groups);
    }

    #[test]
    fn test_corrupt_file_recovered_as_empty() {
        let (repo, temp) = setup();
        fs::write(temp.path().join(GROUPS_FILE), "[{]").unwrap();
        assert!(repo.load_groups().unwrap().is_empty());
    }

    #[test]
    fn test_legacy_document_normalized_on_load() {
        let (repo, temp) = setup();
        let legacy = r#"[{
            "id": "QWE234",
            "name": "Old Crew",
            "desc": "from v1",
            "members": [{"memberId": "m1", "name": "Ada", "joinedAt": 1702516122000}],
            "workLogs": [{"memberId": "m1", "memberName": "Ada", "taskName": "Math", "minutes": 25, "createdAt": 1702516122000}],
            "createdAt": 1702516122000
        }]"#;
        fs::write(temp.path().join(GROUPS_FILE), legacy).unwrap();

        let loaded = repo.load_groups().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].code, "QWE234");
        assert_eq!(loaded[0].description, "from v1");
        // task synthesized from the legacy log
        assert_eq!(loaded[0].tasks.len(), 1);
        assert_eq!(loaded[0].tasks[0].name, "Math");
    }

    #[test]
    fn test_quota_recovery_strips_images() {
        let temp = TempDir::new().unwrap();
        let conn = JsonConnection::with_document_budget(temp.path(), 4096).unwrap();
        let repo = GroupRepository::new(Arc::new(conn));

        let mut group = sample_group("ABC123");
        group.banner_image = "x".repeat(8192);
        group.members[0].avatar_image = "y".repeat(1024);
        group.events.push(WorkLog {
            id: "log::1".to_string(),
            task_id: String::new(),
            task_name: "Design".to_string(),
            description: String::new(),
            minutes: 30,
            stars: 3,
            photo_image: "z".repeat(1024),
            user_id: "u1".to_string(),
            user_name: "Ada".to_string(),
            created_at: group.created_at,
        });

        repo.save_groups(&[group]).unwrap();

        let loaded = repo.load_groups().unwrap();
        assert_eq!(loaded[0].banner_image, "");
        assert_eq!(loaded[0].members[0].avatar_image, "");
        assert_eq!(loaded[0].events[0].photo_image, "");
        // core data survives
        assert_eq!(loaded[0].events[0].minutes, 30);
        assert_eq!(loaded[0].code, "ABC123");
    }

    #[test]
    fn test_quota_exhausted_even_after_stripping() {
        let temp = TempDir::new().unwrap();
        let conn = JsonConnection::with_document_budget(temp.path(), 64).unwrap();
        let repo = GroupRepository::new(Arc::new(conn));

        let err = repo.save_groups(&[sample_group("ABC123")]).unwrap_err();
        let domain = err.downcast_ref::<DomainError>().unwrap();
        assert!(matches!(
            domain,
            DomainError::StorageQuotaExceeded { .. }
        ));
    }
}
