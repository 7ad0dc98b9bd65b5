//! News API endpoints
//!
//! Handles HTTP requests for news management:
//! - GET /api/{version}/news - Paged, filtered and sorted news list
//! - GET /api/{version}/news/{id} - News with author, tags and comments
//! - POST /api/{version}/news - Create news, creating unknown authors and tags
//! - PATCH /api/{version}/news/{id} - Merge-update news
//! - DELETE /api/{version}/news/{id} - Delete news
//! - GET /api/{version}/news/{id}/author|tags|comments - Related entities

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::api::common::{link_builder, parse_search_request, IdPath, Payload};
use crate::api::middleware::{ApiError, ApiVersion, AppState};
use crate::api::responses::{AuthorDto, CommentDto, NewsDto, PageDto, TagDto};
use crate::models::{CreateNewsInput, UpdateNewsInput};
use crate::services::validation::Validate;

/// Build the news router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_news).post(create_news))
        .route(
            "/{id}",
            get(get_news).patch(update_news).delete(delete_news),
        )
        .route("/{id}/author", get(get_news_author))
        .route("/{id}/tags", get(get_news_tags))
        .route("/{id}/comments", get(get_news_comments))
}

/// GET /api/{version}/news
async fn list_news(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    query: RawQuery,
) -> Result<Json<PageDto<NewsDto>>, ApiError> {
    let request = parse_search_request(query, &state.config.api)?;
    let page = state.news_service.read_all(&request).await?;

    let links = link_builder(&state, version);
    Ok(Json(PageDto::new(page, "news", &request, &links, NewsDto::new)))
}

/// GET /api/{version}/news/{id}
async fn get_news(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<NewsDto>, ApiError> {
    let details = state.news_service.read_by_id(id).await?;
    Ok(Json(NewsDto::new(details, &link_builder(&state, version))))
}

/// POST /api/{version}/news
async fn create_news(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Payload(input): Payload<CreateNewsInput>,
) -> Result<(StatusCode, Json<NewsDto>), ApiError> {
    input.validate()?;
    let details = state.news_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(NewsDto::new(details, &link_builder(&state, version))),
    ))
}

/// PATCH /api/{version}/news/{id}
async fn update_news(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
    Payload(input): Payload<UpdateNewsInput>,
) -> Result<Json<NewsDto>, ApiError> {
    input.validate()?;
    let details = state.news_service.update(id, input).await?;
    Ok(Json(NewsDto::new(details, &link_builder(&state, version))))
}

/// DELETE /api/{version}/news/{id}
async fn delete_news(
    State(state): State<AppState>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<StatusCode, ApiError> {
    state.news_service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/{version}/news/{id}/author
async fn get_news_author(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<AuthorDto>, ApiError> {
    let author = state.author_service.read_by_news_id(id).await?;
    Ok(Json(AuthorDto::new(author, &link_builder(&state, version))))
}

/// GET /api/{version}/news/{id}/tags
async fn get_news_tags(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<Vec<TagDto>>, ApiError> {
    let tags = state.tag_service.read_by_news_id(id).await?;
    let links = link_builder(&state, version);
    Ok(Json(tags.into_iter().map(|t| TagDto::new(t, &links)).collect()))
}

/// GET /api/{version}/news/{id}/comments
async fn get_news_comments(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<Vec<CommentDto>>, ApiError> {
    let comments = state.comment_service.read_by_news_id(id).await?;
    let links = link_builder(&state, version);
    Ok(Json(
        comments
            .into_iter()
            .map(|c| CommentDto::new(c, &links))
            .collect(),
    ))
}
