//! # Domain Module
//!
//! Business logic for the group work meter.
//!
//! This module holds the entities, commands, and services that define how
//! groups, members, tasks and work logs behave. It is independent of the REST
//! surface and of the storage backing.
//!
//! ## Module Organization
//!
//! - **user_service**: The single local identity and profile updates
//! - **group_service**: Group lifecycle, join codes, rosters, work logs
//! - **aggregation_service**: Pure total/breakdown computations over logs
//! - **normalization**: Schema migration applied to every loaded group
//! - **commands**: Internal command/result types used between layers
//! - **models**: Domain entities
//! - **errors**: The domain error taxonomy
//!
//! ## Business Rules
//!
//! - A work log always carries a positive duration in whole minutes
//! - Logs are immutable once written; names on them are display snapshots
//! - Task names are unique per group, compared case-insensitively
//! - Join codes are canonicalized before lookup and never matched fuzzily
//! - Every aggregate is derived from the events list, never stored

pub mod aggregation_service;
pub mod commands;
pub mod errors;
pub mod group_service;
pub mod models;
pub mod normalization;
pub mod user_service;

pub use aggregation_service::*;
pub use errors::DomainError;
pub use group_service::GroupService;
pub use user_service::UserService;
