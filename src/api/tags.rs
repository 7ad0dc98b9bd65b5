//! Tag API endpoints
//!
//! Handles HTTP requests for tag management:
//! - GET /api/{version}/tags - Paged tag list
//! - GET /api/{version}/tags/{id} - Tag by ID
//! - POST /api/{version}/tags - Create tag
//! - PATCH /api/{version}/tags/{id} - Rename tag
//! - DELETE /api/{version}/tags/{id} - Delete tag and detach it from news

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::api::common::{link_builder, parse_search_request, IdPath, Payload};
use crate::api::middleware::{ApiError, ApiVersion, AppState};
use crate::api::responses::{PageDto, TagDto};
use crate::models::{CreateTagInput, UpdateTagInput};
use crate::services::validation::Validate;

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", get(get_tag).patch(update_tag).delete(delete_tag))
}

/// GET /api/{version}/tags
async fn list_tags(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    query: RawQuery,
) -> Result<Json<PageDto<TagDto>>, ApiError> {
    let request = parse_search_request(query, &state.config.api)?;
    let page = state.tag_service.read_all(&request).await?;

    let links = link_builder(&state, version);
    Ok(Json(PageDto::new(page, "tags", &request, &links, TagDto::new)))
}

/// GET /api/{version}/tags/{id}
async fn get_tag(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<TagDto>, ApiError> {
    let tag = state.tag_service.read_by_id(id).await?;
    Ok(Json(TagDto::new(tag, &link_builder(&state, version))))
}

/// POST /api/{version}/tags
async fn create_tag(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Payload(input): Payload<CreateTagInput>,
) -> Result<(StatusCode, Json<TagDto>), ApiError> {
    input.validate()?;
    let tag = state.tag_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(TagDto::new(tag, &link_builder(&state, version))),
    ))
}

/// PATCH /api/{version}/tags/{id}
async fn update_tag(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
    Payload(input): Payload<UpdateTagInput>,
) -> Result<Json<TagDto>, ApiError> {
    input.validate()?;
    let tag = state.tag_service.update(id, input).await?;
    Ok(Json(TagDto::new(tag, &link_builder(&state, version))))
}

/// DELETE /api/{version}/tags/{id}
async fn delete_tag(
    State(state): State<AppState>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
