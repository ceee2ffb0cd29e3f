//! Mappers converting between shared DTOs and domain models.

pub mod group_mapper;
pub mod user_mapper;
pub mod worklog_mapper;

pub use group_mapper::GroupMapper;
pub use user_mapper::UserMapper;
pub use worklog_mapper::WorkLogMapper;
