//! # JSON Storage Module
//!
//! File-backed persistence mirroring the original flat key-value document
//! format: one `user.json`, one `groups.json` holding every group record,
//! and a small `config.yaml` for the active-group pointer. All writes are
//! atomic (temp file + rename) and group loads are normalized.

pub mod connection;
pub mod group_repository;
pub mod settings_repository;
pub mod user_repository;

pub use connection::JsonConnection;
pub use group_repository::GroupRepository;
pub use settings_repository::SettingsRepository;
pub use user_repository::UserRepository;
