//! API middleware
//!
//! Contains:
//! - Shared application state
//! - The JSON error envelope and its mapping from service errors
//! - API version negotiation for the `/api/{version}` prefix

use axum::{
    extract::{rejection::JsonRejection, Path, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxAuthorRepository, SqlxCommentRepository, SqlxNewsRepository, SqlxTagRepository,
};
use crate::db::Database;
use crate::services::{
    AuthorService, CommentService, NewsService, ServiceError, ServiceErrorCode, TagService,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub news_service: Arc<NewsService>,
    pub author_service: Arc<AuthorService>,
    pub tag_service: Arc<TagService>,
    pub comment_service: Arc<CommentService>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the SQLx repositories into the services
    pub fn new(db: Database, config: Config) -> Self {
        let news_repo = SqlxNewsRepository::boxed();
        let author_repo = SqlxAuthorRepository::boxed();
        let tag_repo = SqlxTagRepository::boxed();
        let comment_repo = SqlxCommentRepository::boxed();

        Self {
            news_service: Arc::new(NewsService::new(
                db.clone(),
                news_repo.clone(),
                author_repo.clone(),
                tag_repo.clone(),
                comment_repo.clone(),
            )),
            author_service: Arc::new(AuthorService::new(db.clone(), author_repo)),
            tag_service: Arc::new(TagService::new(db.clone(), tag_repo, news_repo.clone())),
            comment_service: Arc::new(CommentService::new(db.clone(), comment_repo, news_repo)),
            config: Arc::new(config),
            db,
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ServiceErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.code().to_string(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: ServiceErrorCode,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.code().to_string(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn version_not_supported() -> Self {
        Self::new(
            ServiceErrorCode::ApiVersionNotSupported,
            ServiceErrorCode::ApiVersionNotSupported.default_message(),
        )
    }

    pub fn internal_error() -> Self {
        Self::new(
            ServiceErrorCode::Unexpected,
            ServiceErrorCode::Unexpected.default_message(),
        )
    }

    /// HTTP status for the error code carried in the body
    pub fn status(&self) -> StatusCode {
        match self.error.code.as_str() {
            "000001" | "000002" | "000003" | "000004" | "000005" | "000014" => {
                StatusCode::NOT_FOUND
            }
            "000013" | "000015" | "000016" => StatusCode::BAD_REQUEST,
            "000021" | "000031" | "000041" | "000051" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::NotFound { code, message } | ServiceError::Conflict { code, message } => {
                Self::new(code, message)
            }
            ServiceError::ValidationFailed(ref fields) => {
                let details = serde_json::to_value(fields).unwrap_or_default();
                Self::with_details(ServiceErrorCode::Validation, err.to_string(), details)
            }
            ServiceError::InvalidArgument(e) => {
                Self::new(ServiceErrorCode::InvalidArgument, e.to_string())
            }
            ServiceError::InternalError(e) => {
                tracing::error!("Unexpected error: {:#}", e);
                Self::internal_error()
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!("Rejected request body: {}", rejection.body_text());
        Self::new(ServiceErrorCode::Validation, rejection.body_text())
    }
}

/// API version accepted for the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiVersion(pub u32);

impl ApiVersion {
    /// Parse a `v<N>` path segment
    pub fn parse(segment: &str) -> Option<Self> {
        segment
            .strip_prefix('v')
            .or_else(|| segment.strip_prefix('V'))
            .filter(|n| !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()))
            .and_then(|n| n.parse().ok())
            .map(Self)
    }
}

#[derive(Debug, Deserialize)]
pub struct VersionPath {
    pub version: String,
}

/// Reject unsupported API versions and record the accepted one
pub async fn api_version(
    State(state): State<AppState>,
    Path(path): Path<VersionPath>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let version = ApiVersion::parse(&path.version)
        .filter(|v| state.config.api.supports(v.0))
        .ok_or_else(|| {
            tracing::debug!("Rejected API version segment {}", path.version);
            ApiError::version_not_supported()
        })?;

    request.extensions_mut().insert(version);
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::SearchError;
    use crate::services::FieldError;

    #[test]
    fn test_parse_version_segment() {
        assert_eq!(ApiVersion::parse("v1"), Some(ApiVersion(1)));
        assert_eq!(ApiVersion::parse("V2"), Some(ApiVersion(2)));
        assert_eq!(ApiVersion::parse("v"), None);
        assert_eq!(ApiVersion::parse("1"), None);
        assert_eq!(ApiVersion::parse("v1.5"), None);
        assert_eq!(ApiVersion::parse("v-1"), None);
    }

    #[test]
    fn test_status_per_error_kind() {
        let not_found: ApiError =
            ServiceError::not_found(ServiceErrorCode::TagIdDoesNotExist, 1).into();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(not_found.error.code, "000003");

        let conflict: ApiError =
            ServiceError::conflict(ServiceErrorCode::NewsConflict, "taken").into();
        assert_eq!(conflict.status(), StatusCode::CONFLICT);

        let invalid: ApiError =
            ServiceError::from(SearchError::UnknownOperator("ALMOST".into())).into();
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);
        assert_eq!(invalid.error.code, "000015");

        let internal: ApiError = ServiceError::from(anyhow::anyhow!("boom")).into();
        assert_eq!(internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(internal.error.message, "Unexpected error happened on server.");

        assert_eq!(
            ApiError::version_not_supported().status(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_validation_error_carries_fields() {
        let err: ApiError = ServiceError::ValidationFailed(vec![FieldError {
            field: "title".into(),
            message: "must not be blank".into(),
        }])
        .into();

        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        let details = err.error.details.unwrap();
        assert_eq!(details[0]["field"], "title");
    }
}
