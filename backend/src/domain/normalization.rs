//! Migration / normalization of persisted group records.
//!
//! Group documents on disk may have been written by earlier schema versions
//! (camelCase field names, epoch-millis timestamps, `workItems`/`workLogs`
//! arrays, no separate `code` field). All defaulting and repair lives here:
//! repositories deserialize into the tolerant [`RawGroup`] shape and call
//! [`normalize_group`] to obtain the canonical domain model. Read sites never
//! default fields themselves.
//!
//! Normalization is idempotent: running it twice over already-canonical data
//! changes nothing, and a code is only regenerated when it is genuinely
//! malformed or collides with another group's code.

use chrono::{DateTime, TimeZone, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

use crate::domain::aggregation_service::color_for;
use crate::domain::models::group::{
    clamp_color_index, generate_unique_code, Group, Member, Task, WorkLog,
};
use crate::domain::models::user::DEFAULT_USERNAME;

/// Group name used when a record carries none
pub const DEFAULT_GROUP_NAME: &str = "Untitled Group";

/// A timestamp as found in persisted documents: RFC 3339 text in the current
/// schema, epoch milliseconds in the oldest one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawTimestamp {
    Millis(i64),
    Text(String),
}

impl Default for RawTimestamp {
    fn default() -> Self {
        RawTimestamp::Text(String::new())
    }
}

impl RawTimestamp {
    /// Resolve to a concrete time, falling back to `now` when missing or
    /// unparseable.
    fn resolve(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            RawTimestamp::Millis(ms) => Utc
                .timestamp_millis_opt(*ms)
                .single()
                .unwrap_or(now),
            RawTimestamp::Text(s) if s.is_empty() => now,
            RawTimestamp::Text(s) => match DateTime::parse_from_rfc3339(s) {
                Ok(dt) => dt.with_timezone(&Utc),
                Err(_) => {
                    warn!("Unparseable timestamp {:?}, defaulting to now", s);
                    now
                }
            },
        }
    }

    fn from_time(dt: DateTime<Utc>) -> Self {
        RawTimestamp::Text(dt.to_rfc3339())
    }
}

/// Persisted group record, tolerant of every schema version seen in the wild.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGroup {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default, alias = "bannerDataUrl", alias = "bannerImage")]
    pub banner_image: String,
    #[serde(default)]
    pub members: Vec<RawMember>,
    #[serde(default, alias = "workItems", alias = "todos")]
    pub tasks: Vec<RawTask>,
    #[serde(default, alias = "workLogs")]
    pub events: Vec<RawWorkLog>,
    #[serde(default, alias = "completedTaskIds")]
    pub completed_task_ids: Vec<String>,
    #[serde(default, alias = "createdBy")]
    pub created_by: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: RawTimestamp,
    #[serde(default, alias = "updatedAt")]
    pub updated_at: RawTimestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawMember {
    #[serde(default, alias = "memberId", alias = "userId")]
    pub user_id: String,
    #[serde(default, alias = "name", alias = "displayName")]
    pub username: String,
    #[serde(default, alias = "photoDataUrl", alias = "avatarImage")]
    pub avatar_image: String,
    #[serde(default, alias = "joinedAt")]
    pub joined_at: RawTimestamp,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTask {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: RawTimestamp,
    #[serde(default, alias = "colorIndex")]
    pub color_index: u8,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawWorkLog {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "taskId")]
    pub task_id: String,
    #[serde(default, alias = "taskName", alias = "subject")]
    pub task_name: String,
    #[serde(default, alias = "desc")]
    pub description: String,
    #[serde(default)]
    pub minutes: f64,
    #[serde(default, alias = "difficulty")]
    pub stars: u8,
    #[serde(default, alias = "photoDataUrl", alias = "photoImage")]
    pub photo_image: String,
    #[serde(default, alias = "memberId", alias = "userId")]
    pub user_id: String,
    #[serde(default, alias = "memberName", alias = "userName")]
    pub user_name: String,
    #[serde(default, alias = "createdAt")]
    pub created_at: RawTimestamp,
}

impl From<Group> for RawGroup {
    fn from(group: Group) -> Self {
        RawGroup {
            id: group.id,
            code: group.code,
            name: group.name,
            description: group.description,
            banner_image: group.banner_image,
            members: group
                .members
                .into_iter()
                .map(|m| RawMember {
                    user_id: m.user_id,
                    username: m.username,
                    avatar_image: m.avatar_image,
                    joined_at: RawTimestamp::from_time(m.joined_at),
                })
                .collect(),
            tasks: group
                .tasks
                .into_iter()
                .map(|t| RawTask {
                    id: t.id,
                    name: t.name,
                    created_at: RawTimestamp::from_time(t.created_at),
                    color_index: t.color_index,
                })
                .collect(),
            events: group
                .events
                .into_iter()
                .map(|e| RawWorkLog {
                    id: e.id,
                    task_id: e.task_id,
                    task_name: e.task_name,
                    description: e.description,
                    minutes: f64::from(e.minutes),
                    stars: e.stars,
                    photo_image: e.photo_image,
                    user_id: e.user_id,
                    user_name: e.user_name,
                    created_at: RawTimestamp::from_time(e.created_at),
                })
                .collect(),
            completed_task_ids: group.completed_task_ids.into_iter().collect(),
            created_by: group.created_by,
            created_at: RawTimestamp::from_time(group.created_at),
            updated_at: RawTimestamp::from_time(group.updated_at),
        }
    }
}

/// Normalize one persisted group record into the canonical domain shape.
///
/// `taken_codes` holds the codes already claimed by other groups; the code is
/// regenerated only when it is malformed or collides with one of them. Any
/// externally shared invite link embedding a regenerated code becomes invalid,
/// which is why valid codes are always preserved.
pub fn normalize_group<R: Rng>(
    raw: RawGroup,
    taken_codes: &HashSet<String>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Group {
    let created_at = raw.created_at.resolve(now);
    let updated_at = raw.updated_at.resolve(now);

    // The oldest schema had no separate code field; the id *was* the code.
    let candidate = if raw.code.is_empty() {
        raw.id.clone()
    } else {
        raw.code.clone()
    };
    let code = if shared::is_valid_group_code(&candidate) && !taken_codes.contains(&candidate) {
        candidate
    } else {
        let fresh = generate_unique_code(rng, |c| taken_codes.contains(c));
        warn!(
            old = %candidate,
            new = %fresh,
            "Repairing invalid or colliding group code; shared invite links go stale"
        );
        fresh
    };
    let id = if raw.id.is_empty() {
        code.clone()
    } else {
        raw.id
    };

    let members: Vec<Member> = raw
        .members
        .into_iter()
        .map(|m| Member {
            user_id: m.user_id,
            username: if m.username.trim().is_empty() {
                DEFAULT_USERNAME.to_string()
            } else {
                m.username.trim().to_string()
            },
            avatar_image: m.avatar_image,
            joined_at: m.joined_at.resolve(now),
        })
        .collect();

    let events: Vec<WorkLog> = raw
        .events
        .into_iter()
        .map(|e| {
            let event_created = e.created_at.resolve(now);
            WorkLog {
                id: if e.id.is_empty() {
                    shared::WorkLog::generate_id(event_created.timestamp_millis() as u64)
                } else {
                    e.id
                },
                task_id: e.task_id,
                task_name: e.task_name.trim().to_string(),
                description: e.description,
                minutes: e.minutes.max(0.0).round() as u32,
                stars: e.stars.clamp(1, 5),
                photo_image: e.photo_image,
                user_id: e.user_id,
                user_name: e.user_name,
                created_at: event_created,
            }
        })
        .collect();

    let mut tasks: Vec<Task> = raw
        .tasks
        .into_iter()
        .map(|t| {
            let task_created = t.created_at.resolve(now);
            Task {
                id: if t.id.is_empty() {
                    shared::Task::generate_id(task_created.timestamp_millis() as u64)
                } else {
                    t.id
                },
                name: t.name.trim().to_string(),
                created_at: task_created,
                color_index: clamp_color_index(t.color_index),
            }
        })
        .collect();

    // Reconstruct tasks from the event log: every distinct task name in the
    // history gets a task entry, so logs written before tasks were first-class
    // still resolve.
    for event in &events {
        if event.task_name.is_empty() {
            continue;
        }
        let known = tasks
            .iter()
            .any(|t| t.name.to_lowercase() == event.task_name.to_lowercase());
        if !known {
            let id = if event.task_id.is_empty() {
                shared::Task::generate_id(event.created_at.timestamp_millis() as u64)
            } else {
                event.task_id.clone()
            };
            debug!(task = %event.task_name, "Synthesizing task from event log");
            tasks.push(Task {
                color_index: color_for(&id),
                id,
                name: event.task_name.clone(),
                created_at: event.created_at,
            });
        }
    }

    let completed_task_ids: BTreeSet<String> = raw
        .completed_task_ids
        .into_iter()
        .filter(|id| !id.is_empty())
        .collect();

    Group {
        id,
        code,
        name: if raw.name.trim().is_empty() {
            DEFAULT_GROUP_NAME.to_string()
        } else {
            raw.name.trim().to_string()
        },
        description: raw.description.trim().to_string(),
        banner_image: raw.banner_image,
        members,
        tasks,
        events,
        completed_task_ids,
        created_by: raw.created_by,
        created_at,
        updated_at,
    }
}

/// Normalize a whole persisted group list. Codes are claimed in list order,
/// so when two records collide the later one is regenerated.
pub fn normalize_groups<R: Rng>(
    raws: Vec<RawGroup>,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Group> {
    let mut taken: HashSet<String> = HashSet::new();
    let mut groups = Vec::with_capacity(raws.len());
    for raw in raws {
        let group = normalize_group(raw, &taken, rng, now);
        taken.insert(group.code.clone());
        groups.push(group);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults_backfilled() {
        let group = normalize_group(RawGroup::default(), &HashSet::new(), &mut rng(), now());

        assert_eq!(group.name, DEFAULT_GROUP_NAME);
        assert!(shared::is_valid_group_code(&group.code));
        assert_eq!(group.id, group.code);
        assert!(group.members.is_empty());
        assert!(group.tasks.is_empty());
        assert!(group.events.is_empty());
        assert_eq!(group.created_at, now());
    }

    #[test]
    fn test_valid_code_preserved() {
        let raw = RawGroup {
            id: "ABC123".to_string(),
            code: "ABC123".to_string(),
            name: "Study".to_string(),
            ..Default::default()
        };
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());
        assert_eq!(group.code, "ABC123");
    }

    #[test]
    fn test_malformed_code_regenerated() {
        let raw = RawGroup {
            id: "abc".to_string(),
            code: "abc".to_string(),
            ..Default::default()
        };
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());
        assert_ne!(group.code, "abc");
        assert!(shared::is_valid_group_code(&group.code));
    }

    #[test]
    fn test_colliding_code_regenerated() {
        let taken: HashSet<String> = ["ABC123".to_string()].into_iter().collect();
        let raw = RawGroup {
            code: "ABC123".to_string(),
            ..Default::default()
        };
        let group = normalize_group(raw, &taken, &mut rng(), now());
        assert_ne!(group.code, "ABC123");
        assert!(!taken.contains(&group.code));
    }

    #[test]
    fn test_code_taken_from_legacy_id() {
        // oldest schema: the id was the code, no code field at all
        let raw = RawGroup {
            id: "XYZ789".to_string(),
            ..Default::default()
        };
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());
        assert_eq!(group.code, "XYZ789");
        assert_eq!(group.id, "XYZ789");
    }

    #[test]
    fn test_tasks_reconstructed_from_events() {
        let raw = RawGroup {
            code: "ABC123".to_string(),
            events: vec![
                RawWorkLog {
                    task_id: "task::100".to_string(),
                    task_name: "Design".to_string(),
                    minutes: 60.0,
                    user_id: "u1".to_string(),
                    ..Default::default()
                },
                RawWorkLog {
                    task_name: "design".to_string(), // same task, different case
                    minutes: 30.0,
                    user_id: "u2".to_string(),
                    ..Default::default()
                },
                RawWorkLog {
                    task_name: "Code".to_string(),
                    minutes: 45.0,
                    user_id: "u1".to_string(),
                    ..Default::default()
                },
            ],
            ..Default::default()
        };
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());

        assert_eq!(group.tasks.len(), 2);
        assert_eq!(group.tasks[0].id, "task::100");
        assert_eq!(group.tasks[0].name, "Design");
        assert_eq!(group.tasks[1].name, "Code");
        assert!(group.tasks.iter().all(|t| t.color_index < 4));
    }

    #[test]
    fn test_existing_tasks_not_duplicated() {
        let raw = RawGroup {
            code: "ABC123".to_string(),
            tasks: vec![RawTask {
                id: "task::1".to_string(),
                name: "Design".to_string(),
                ..Default::default()
            }],
            events: vec![RawWorkLog {
                task_id: "task::1".to_string(),
                task_name: "DESIGN".to_string(),
                minutes: 10.0,
                ..Default::default()
            }],
            ..Default::default()
        };
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());
        assert_eq!(group.tasks.len(), 1);
    }

    #[test]
    fn test_legacy_field_names_accepted() {
        let json = r#"{
            "id": "QRS234",
            "name": "Legacy",
            "desc": "old shape",
            "bannerDataUrl": "data:image/png;base64,xxx",
            "members": [
                {"memberId": "m1", "name": "Ada", "photoDataUrl": "", "joinedAt": 1702516122000}
            ],
            "workLogs": [
                {"memberId": "m1", "memberName": "Ada", "subject": "Math", "minutes": 25, "createdAt": 1702516122000}
            ],
            "createdAt": 1702516122000
        }"#;
        let raw: RawGroup = serde_json::from_str(json).unwrap();
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());

        assert_eq!(group.code, "QRS234");
        assert_eq!(group.description, "old shape");
        assert_eq!(group.members.len(), 1);
        assert_eq!(group.members[0].user_id, "m1");
        assert_eq!(group.members[0].username, "Ada");
        assert_eq!(group.events.len(), 1);
        assert_eq!(group.events[0].task_name, "Math");
        assert_eq!(group.events[0].user_name, "Ada");
        // task synthesized from the old-style log
        assert_eq!(group.tasks.len(), 1);
        assert_eq!(group.tasks[0].name, "Math");
        // epoch-millis timestamp resolved, not defaulted
        assert_eq!(
            group.events[0].created_at.timestamp_millis(),
            1702516122000
        );
    }

    #[test]
    fn test_stars_and_color_index_clamped() {
        let raw = RawGroup {
            code: "ABC123".to_string(),
            tasks: vec![RawTask {
                id: "task::1".to_string(),
                name: "T".to_string(),
                color_index: 9,
                ..Default::default()
            }],
            events: vec![RawWorkLog {
                task_id: "task::1".to_string(),
                task_name: "T".to_string(),
                minutes: 5.0,
                stars: 0,
                ..Default::default()
            }],
            ..Default::default()
        };
        let group = normalize_group(raw, &HashSet::new(), &mut rng(), now());
        assert_eq!(group.tasks[0].color_index, 3);
        assert_eq!(group.events[0].stars, 1);
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let raw = RawGroup {
            id: "oops".to_string(), // malformed, regenerated on first pass
            name: "  Team  ".to_string(),
            members: vec![RawMember {
                user_id: "u1".to_string(),
                username: "".to_string(),
                ..Default::default()
            }],
            events: vec![RawWorkLog {
                task_name: "Design".to_string(),
                minutes: 60.5,
                user_id: "u1".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let once = normalize_group(raw, &HashSet::new(), &mut rng(), now());
        let twice = normalize_group(
            RawGroup::from(once.clone()),
            &HashSet::new(),
            &mut rng(),
            now(),
        );
        assert_eq!(once, twice);
    }

    #[test]
    fn test_normalize_groups_resolves_internal_collisions() {
        let raws = vec![
            RawGroup {
                code: "ABC123".to_string(),
                ..Default::default()
            },
            RawGroup {
                code: "ABC123".to_string(),
                ..Default::default()
            },
        ];
        let groups = normalize_groups(raws, &mut rng(), now());
        assert_eq!(groups[0].code, "ABC123");
        assert_ne!(groups[1].code, "ABC123");
        assert!(shared::is_valid_group_code(&groups[1].code));
    }
}
