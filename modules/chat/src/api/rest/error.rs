use axum::http::StatusCode;
use modkit::ProblemResponse;

use crate::domain::error::DomainError;

/// Map a domain error to an RFC 9457 problem for `instance`.
pub fn map_domain_error(e: &DomainError, instance: &str) -> ProblemResponse {
    match e {
        DomainError::Validation { .. } => ProblemResponse::from_parts(
            StatusCode::BAD_REQUEST,
            "CHAT_VALIDATION",
            "Validation failed",
            e.to_string(),
            instance,
        ),
        DomainError::SelfChat { .. } => ProblemResponse::from_parts(
            StatusCode::BAD_REQUEST,
            "CHAT_SELF",
            "Cannot chat with yourself",
            e.to_string(),
            instance,
        ),
        DomainError::ContentTooLong { .. } => ProblemResponse::from_parts(
            StatusCode::BAD_REQUEST,
            "CHAT_CONTENT_TOO_LONG",
            "Message too long",
            e.to_string(),
            instance,
        ),
        DomainError::ChatNotFound { .. } => ProblemResponse::from_parts(
            StatusCode::NOT_FOUND,
            "CHAT_NOT_FOUND",
            "Chat not found",
            e.to_string(),
            instance,
        ),
        DomainError::NotParticipant { .. } => ProblemResponse::from_parts(
            StatusCode::FORBIDDEN,
            "CHAT_FORBIDDEN",
            "Not a chat participant",
            e.to_string(),
            instance,
        ),
        DomainError::Database { .. } => {
            // Cause already logged by the service.
            tracing::debug!(instance, "Database error mapped to 500");
            ProblemResponse::from_parts(
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_DB",
                "Internal Server Error",
                "An internal database error occurred",
                instance,
            )
        }
    }
}
