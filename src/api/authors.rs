//! Author API endpoints
//!
//! - GET /api/{version}/authors - Paged author list
//! - GET /api/{version}/authors/{id} - Author by ID
//! - POST /api/{version}/authors - Create author
//! - PATCH /api/{version}/authors/{id} - Rename author
//! - DELETE /api/{version}/authors/{id} - Delete author without news

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    routing::get,
    Extension, Json, Router,
};

use crate::api::common::{link_builder, parse_search_request, IdPath, Payload};
use crate::api::middleware::{ApiError, ApiVersion, AppState};
use crate::api::responses::{AuthorDto, PageDto};
use crate::models::{CreateAuthorInput, UpdateAuthorInput};
use crate::services::validation::Validate;

/// Build the authors router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_authors).post(create_author))
        .route(
            "/{id}",
            get(get_author).patch(update_author).delete(delete_author),
        )
}

async fn list_authors(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    query: RawQuery,
) -> Result<Json<PageDto<AuthorDto>>, ApiError> {
    let request = parse_search_request(query, &state.config.api)?;
    let page = state.author_service.read_all(&request).await?;

    let links = link_builder(&state, version);
    Ok(Json(PageDto::new(page, "authors", &request, &links, AuthorDto::new)))
}

async fn get_author(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<Json<AuthorDto>, ApiError> {
    let author = state.author_service.read_by_id(id).await?;
    Ok(Json(AuthorDto::new(author, &link_builder(&state, version))))
}

async fn create_author(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Payload(input): Payload<CreateAuthorInput>,
) -> Result<(StatusCode, Json<AuthorDto>), ApiError> {
    input.validate()?;
    let author = state.author_service.create(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(AuthorDto::new(author, &link_builder(&state, version))),
    ))
}

async fn update_author(
    State(state): State<AppState>,
    Extension(version): Extension<ApiVersion>,
    Path(IdPath { id }): Path<IdPath>,
    Payload(input): Payload<UpdateAuthorInput>,
) -> Result<Json<AuthorDto>, ApiError> {
    input.validate()?;
    let author = state.author_service.update(id, input).await?;
    Ok(Json(AuthorDto::new(author, &link_builder(&state, version))))
}

async fn delete_author(
    State(state): State<AppState>,
    Path(IdPath { id }): Path<IdPath>,
) -> Result<StatusCode, ApiError> {
    state.author_service.delete_by_id(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
