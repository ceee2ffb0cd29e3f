//! Storage layer: abstraction traits plus the JSON file implementation.

pub mod json;
pub mod traits;

pub use json::{GroupRepository, JsonConnection, SettingsRepository, UserRepository};
pub use traits::{GroupStorage, SettingsStorage, UserStorage};
