use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use shared::TASK_COLOR_SLOTS;

/// Alphabet used when generating join codes. Excludes the easily-confused
/// characters I, O, 0 and 1; validation still accepts the full A-Z0-9 class.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Length of a group join code
pub const CODE_LEN: usize = 6;

/// Prefix for placeholder members created from invite labels. These stand in
/// for people who were invited by name but have not joined yet; a real user id
/// is a uuid and can never collide with this prefix.
pub const INVITED_MEMBER_PREFIX: &str = "INV_";

/// A shared tracking workspace (domain model).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub code: String,
    pub name: String,
    pub description: String,
    pub banner_image: String,
    pub members: Vec<Member>,
    pub tasks: Vec<Task>,
    pub events: Vec<WorkLog>,
    pub completed_task_ids: BTreeSet<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A user's membership record within a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: String,
    pub username: String,
    pub avatar_image: String,
    pub joined_at: DateTime<Utc>,
}

impl Member {
    /// Whether this roster entry is an invite placeholder rather than a
    /// joined user.
    pub fn is_invited_placeholder(&self) -> bool {
        self.user_id.starts_with(INVITED_MEMBER_PREFIX)
    }
}

/// A named unit of work that time can be logged against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub color_index: u8,
}

/// An immutable record of minutes spent by a member on a task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkLog {
    pub id: String,
    pub task_id: String,
    /// Display snapshot of the task name at log time
    pub task_name: String,
    pub description: String,
    pub minutes: u32,
    pub stars: u8,
    pub photo_image: String,
    pub user_id: String,
    /// Display snapshot of the user name at log time
    pub user_name: String,
    pub created_at: DateTime<Utc>,
}

impl Group {
    /// Look up a task by id.
    pub fn find_task(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == task_id)
    }

    /// Look up a task by name, case-insensitively. Task names are unique per
    /// group under this comparison.
    pub fn find_task_by_name(&self, name: &str) -> Option<&Task> {
        let needle = name.trim().to_lowercase();
        self.tasks.iter().find(|t| t.name.to_lowercase() == needle)
    }

    /// Look up a member by user id.
    pub fn find_member(&self, user_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.user_id == user_id)
    }

    pub fn find_member_mut(&mut self, user_id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.user_id == user_id)
    }
}

/// Generate a fresh join code, rejection-sampled so it never collides with a
/// code already in use.
pub fn generate_unique_code<R, F>(rng: &mut R, is_taken: F) -> String
where
    R: rand::Rng,
    F: Fn(&str) -> bool,
{
    loop {
        let code: String = (0..CODE_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..CODE_ALPHABET.len());
                CODE_ALPHABET[idx] as char
            })
            .collect();
        if !is_taken(&code) {
            return code;
        }
    }
}

/// Clamp a task color slot into the palette range.
pub fn clamp_color_index(raw: u8) -> u8 {
    raw.min(TASK_COLOR_SLOTS - 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn task(id: &str, name: &str) -> Task {
        Task {
            id: id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
            color_index: 0,
        }
    }

    #[test]
    fn test_find_task_by_name_is_case_insensitive() {
        let mut group = empty_group();
        group.tasks.push(task("task::1", "Design"));

        assert!(group.find_task_by_name("design").is_some());
        assert!(group.find_task_by_name("  DESIGN ").is_some());
        assert!(group.find_task_by_name("Code").is_none());
    }

    #[test]
    fn test_generate_unique_code_shape() {
        let mut rng = rand::thread_rng();
        let code = generate_unique_code(&mut rng, |_| false);
        assert_eq!(code.len(), CODE_LEN);
        assert!(shared::is_valid_group_code(&code));
        // the unambiguous alphabet never emits these
        assert!(!code.contains(['I', 'O', '0', '1']));
    }

    #[test]
    fn test_generate_unique_code_rejects_taken() {
        let mut rng = rand::thread_rng();
        let first = generate_unique_code(&mut rng, |_| false);
        let second = generate_unique_code(&mut rng, |c| c == first);
        assert_ne!(first, second);
    }

    #[test]
    fn test_clamp_color_index() {
        assert_eq!(clamp_color_index(0), 0);
        assert_eq!(clamp_color_index(3), 3);
        assert_eq!(clamp_color_index(4), 3);
        assert_eq!(clamp_color_index(250), 3);
    }

    #[test]
    fn test_invited_placeholder_detection() {
        let mut m = Member {
            user_id: "INV_ABC123_0".to_string(),
            username: "Dana".to_string(),
            avatar_image: String::new(),
            joined_at: Utc::now(),
        };
        assert!(m.is_invited_placeholder());
        m.user_id = "2c4b7a10-0000-0000-0000-000000000000".to_string();
        assert!(!m.is_invited_placeholder());
    }

    fn empty_group() -> Group {
        let now = Utc::now();
        Group {
            id: "ABC123".to_string(),
            code: "ABC123".to_string(),
            name: "Test".to_string(),
            description: String::new(),
            banner_image: String::new(),
            members: Vec::new(),
            tasks: Vec::new(),
            events: Vec::new(),
            completed_task_ids: BTreeSet::new(),
            created_by: "user-a".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}
