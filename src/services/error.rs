//! Service error taxonomy
//!
//! Every service operation fails with a `ServiceError`. Not-found and
//! conflict errors carry a stable `ServiceErrorCode` that the API layer
//! passes through to clients unchanged.

use serde::Serialize;
use std::fmt;

use crate::db::{is_foreign_key_violation, is_unique_violation};
use crate::search::SearchError;

/// Stable machine-readable error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceErrorCode {
    NewsIdDoesNotExist,
    AuthorIdDoesNotExist,
    TagIdDoesNotExist,
    AuthorDoesNotExistForNewsId,
    CommentIdDoesNotExist,
    Validation,
    ResourceNotFound,
    InvalidArgument,
    ApiVersionNotSupported,
    AuthorConflict,
    NewsConflict,
    TagConflict,
    CommentConflict,
    Unexpected,
}

impl ServiceErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            Self::NewsIdDoesNotExist => "000001",
            Self::AuthorIdDoesNotExist => "000002",
            Self::TagIdDoesNotExist => "000003",
            Self::AuthorDoesNotExistForNewsId => "000004",
            Self::CommentIdDoesNotExist => "000005",
            Self::Validation => "000013",
            Self::ResourceNotFound => "000014",
            Self::InvalidArgument => "000015",
            Self::ApiVersionNotSupported => "000016",
            Self::AuthorConflict => "000021",
            Self::NewsConflict => "000031",
            Self::TagConflict => "000041",
            Self::Unexpected => "000050",
            Self::CommentConflict => "000051",
        }
    }

    /// Message for an entity id that does not resolve
    pub fn id_message(&self, id: i64) -> String {
        match self {
            Self::NewsIdDoesNotExist => format!("News with id {} does not exist.", id),
            Self::AuthorIdDoesNotExist => format!("Author with id {} does not exist.", id),
            Self::TagIdDoesNotExist => format!("Tag with id {} does not exist.", id),
            Self::AuthorDoesNotExistForNewsId => {
                format!("Author not found for news with id {}.", id)
            }
            Self::CommentIdDoesNotExist => format!("Comment with id {} does not exist.", id),
            other => format!("{} (id {})", other.default_message(), id),
        }
    }

    pub fn default_message(&self) -> &'static str {
        match self {
            Self::Validation => "Validation failed.",
            Self::ResourceNotFound => "Resource not found.",
            Self::InvalidArgument => "Invalid search or sort argument.",
            Self::ApiVersionNotSupported => "This API version is not supported.",
            Self::AuthorConflict => "Author has a persistence conflict.",
            Self::NewsConflict => "News has a persistence conflict.",
            Self::TagConflict => "Tag has a persistence conflict.",
            Self::CommentConflict => "Comment has a persistence conflict.",
            Self::Unexpected => "Unexpected error happened on server.",
            Self::NewsIdDoesNotExist
            | Self::AuthorIdDoesNotExist
            | Self::TagIdDoesNotExist
            | Self::AuthorDoesNotExistForNewsId
            | Self::CommentIdDoesNotExist => "Entity does not exist.",
        }
    }
}

impl fmt::Display for ServiceErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// One rejected input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Error types for service operations
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Requested or referenced entity is absent
    #[error("{message}")]
    NotFound {
        code: ServiceErrorCode,
        message: String,
    },

    /// Uniqueness or reference violation reported by the store
    #[error("{message}")]
    Conflict {
        code: ServiceErrorCode,
        message: String,
    },

    /// Request payload failed field validation
    #[error("Validation failed: {}", join_field_errors(.0))]
    ValidationFailed(Vec<FieldError>),

    /// Malformed sort or filter parameter
    #[error(transparent)]
    InvalidArgument(#[from] SearchError),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{} {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ServiceError {
    pub fn not_found(code: ServiceErrorCode, id: i64) -> Self {
        Self::NotFound {
            code,
            message: code.id_message(id),
        }
    }

    pub fn not_found_with(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self::Conflict {
            code,
            message: message.into(),
        }
    }

    /// Map a store error to `Conflict` when it is a constraint violation
    pub fn from_write(err: anyhow::Error, code: ServiceErrorCode) -> Self {
        if is_unique_violation(&err) || is_foreign_key_violation(&err) {
            tracing::warn!("Persistence conflict ({}): {:#}", code, err);
            Self::Conflict {
                code,
                message: code.default_message().to_string(),
            }
        } else {
            Self::InternalError(err)
        }
    }

    /// Stable code of this error
    pub fn code(&self) -> ServiceErrorCode {
        match self {
            Self::NotFound { code, .. } | Self::Conflict { code, .. } => *code,
            Self::ValidationFailed(_) => ServiceErrorCode::Validation,
            Self::InvalidArgument(_) => ServiceErrorCode::InvalidArgument,
            Self::InternalError(_) => ServiceErrorCode::Unexpected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(ServiceErrorCode::NewsIdDoesNotExist.code(), "000001");
        assert_eq!(ServiceErrorCode::AuthorDoesNotExistForNewsId.code(), "000004");
        assert_eq!(ServiceErrorCode::ApiVersionNotSupported.code(), "000016");
        assert_eq!(ServiceErrorCode::NewsConflict.code(), "000031");
        assert_eq!(ServiceErrorCode::Unexpected.code(), "000050");
    }

    #[test]
    fn test_not_found_message() {
        let err = ServiceError::not_found(ServiceErrorCode::NewsIdDoesNotExist, 42);
        assert_eq!(err.to_string(), "News with id 42 does not exist.");
        assert_eq!(err.code(), ServiceErrorCode::NewsIdDoesNotExist);
    }

    #[test]
    fn test_validation_message_lists_fields() {
        let err = ServiceError::ValidationFailed(vec![
            FieldError {
                field: "title".into(),
                message: "must be between 5 and 30 characters".into(),
            },
            FieldError {
                field: "author".into(),
                message: "must not be blank".into(),
            },
        ]);
        assert_eq!(
            err.to_string(),
            "Validation failed: title must be between 5 and 30 characters; author must not be blank"
        );
    }

    #[test]
    fn test_search_error_becomes_invalid_argument() {
        let err: ServiceError = SearchError::UnknownField("password".into()).into();
        assert_eq!(err.code(), ServiceErrorCode::InvalidArgument);
    }

    #[test]
    fn test_from_write_keeps_plain_errors_internal() {
        let err = ServiceError::from_write(anyhow::anyhow!("disk full"), ServiceErrorCode::TagConflict);
        assert!(matches!(err, ServiceError::InternalError(_)));
    }
}
