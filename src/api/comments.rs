//! Comment API endpoints
//!
//! Comments are updated with PUT; only the content can change.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::api::common::{link_builder, parse_search_request, IdPath, Payload};
use crate::api::middleware::{ApiError, ApiVersion, AppState};
use crate::api::responses::{CommentDto, PageDto};
use crate::models::{CreateCommentInput, UpdateCommentInput};
use crate::services::validation::Validate;

/// Build the comments router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_comments).post(create_comment))
        .route(
            "/{id}",
            get(get_comment).put(update_comment).delete(delete_comment),
        )
}

async fn list_comments(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    query: RawQuery,
) -> Result<Json<PageDto<CommentDto>>, ApiError> {
    let request = parse_search_request(query, &state.config.api)?;
    let page = state.comment_service.read_all(&request).await?;

    let links = link_builder(&state, version);
    Ok(Json(PageDto::new(page, "comments", &request, &links, CommentDto::new)))
}

async fn get_comment(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<CommentDto>, ApiError> {
    let comment = state.comment_service.read_by_id(id).await?;
    Ok(Json(CommentDto::new(comment, &link_builder(&state, version))))
}

async fn create_comment(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Payload(input): Payload<CreateCommentInput>,
) -> Result<(StatusCode, Json<CommentDto>), ApiError> {
    input.validate()?;
    let comment = state.comment_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(CommentDto::new(comment, &link_builder(&state, version))),
    ))
}

async fn update_comment(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
    Payload(input): Payload<UpdateCommentInput>,
) -> Result<Json<CommentDto>, ApiError> {
    input.validate()?;
    let comment = state.comment_service.update(id, input).await?;
    Ok(Json(CommentDto::new(comment, &link_builder(&state, version))))
}

async fn delete_comment(
    State(state): State<AppState>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<StatusCode, ApiError> {
    state.comment_service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
