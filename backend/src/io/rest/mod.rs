//! # REST API Interface Layer
//!
//! HTTP endpoints for the group work meter. This layer handles:
//! - Request/response serialization
//! - Error translation from domain errors to HTTP status codes
//! - Request logging
//!
//! Handlers stay free of business logic: they map DTOs to domain commands,
//! call the service, and map the result back.

pub mod group_apis;
pub mod mappers;
pub mod profile_apis;
pub mod report_apis;
pub mod worklog_apis;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::domain::DomainError;

/// Translate a failed service call into an HTTP response. Validation failures
/// carry their message to the caller; anything else is logged and hidden
/// behind a generic 500.
pub(crate) fn map_service_error(context: &str, error: anyhow::Error) -> Response {
    match error.downcast_ref::<DomainError>() {
        Some(DomainError::GroupNotFound(_)) => {
            (StatusCode::NOT_FOUND, error.to_string()).into_response()
        }
        Some(domain_error) if domain_error.is_validation() => {
            (StatusCode::BAD_REQUEST, error.to_string()).into_response()
        }
        _ => {
            error!("{}: {:#}", context, error);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error").into_response()
        }
    }
}
