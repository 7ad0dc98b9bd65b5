//! Common API utilities and shared types
//!
//! List endpoints take repeatable query parameters, which the plain
//! `Query` extractor cannot collect, so the raw query string is parsed here.

use axum::extract::{FromRequest, RawQuery};
use serde::Deserialize;

use crate::api::middleware::{ApiError, ApiVersion, AppState};
use crate::api::responses::LinkBuilder;
use crate::config::ApiConfig;
use crate::search::SearchRequest;
use crate::services::ServiceErrorCode;

/// Path of a single resource; the version segment is handled by middleware
#[derive(Debug, Deserialize)]
pub struct IdPath {
    pub id: i64,
}

/// JSON request body; malformed or incomplete bodies are rejected with a
/// validation error in the usual error envelope
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct Payload<T>(pub T);

/// Link builder for the API version of the current request
pub fn link_builder(state: &AppState, version: ApiVersion) -> LinkBuilder {
    LinkBuilder::new(&state.config.server.public_url, version.0)
}

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

/// Build a `SearchRequest` from the raw query string
///
/// Recognised parameters:
/// - `page` (default 1)
/// - `pageSize` (default from config)
/// - `sortByAndOrder`, repeatable, each value may also hold a comma-separated list
/// - `searchCriteria`, repeatable
///
/// # Errors
/// `ValidationFailed` when `page` or `pageSize` is not a number or is out of range.
pub fn parse_search_request(
    RawQuery(query): RawQuery,
    api: &ApiConfig,
) -> Result<SearchRequest, ApiError> {
    let mut request = SearchRequest {
        page: default_page(),
        page_size: api.default_page_size,
        ..Default::default()
    };
    let mut problems = Vec::new();

    for (key, value) in query.as_deref().map(parse_pairs).unwrap_or_default() {
        match key.as_str() {
            "page" => match value.trim().parse::<u32>() {
                Ok(page) => request.page = page,
                Err(_) => problems.push(field_problem("page", "must be a positive integer")),
            },
            "pageSize" => match value.trim().parse::<u32>() {
                Ok(size) => request.page_size = size,
                Err(_) => problems.push(field_problem("pageSize", "must be a positive integer")),
            },
            "sortByAndOrder" => request.sort_by_and_order.extend(
                value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(String::from),
            ),
            "searchCriteria" if !value.trim().is_empty() => {
                request.search_criteria.push(value.trim().to_string())
            }
            _ => {}
        }
    }

    if problems.is_empty() {
        if request.page < 1 {
            problems.push(field_problem("page", "must be at least 1"));
        }
        if request.page_size < 1 || request.page_size > api.max_page_size {
            problems.push(field_problem(
                "pageSize",
                &format!("must be between 1 and {}", api.max_page_size),
            ));
        }
    }

    if problems.is_empty() {
        Ok(request)
    } else {
        Err(ApiError::with_details(
            ServiceErrorCode::Validation,
            "Validation failed: invalid paging parameters",
            serde_json::Value::Array(problems),
        ))
    }
}

fn field_problem(field: &str, message: &str) -> serde_json::Value {
    serde_json::json!({ "field": field, "message": message })
}

/// Split `a=1&b=2` into decoded key/value pairs; `+` counts as a space
fn parse_pairs(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
            (decode(key), decode(value))
        })
        .collect()
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .unwrap_or(spaced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiConfig {
        ApiConfig::default()
    }

    fn parse(query: &str) -> Result<SearchRequest, ApiError> {
        parse_search_request(RawQuery(Some(query.to_string())), &api())
    }

    #[test]
    fn test_defaults() {
        let request = parse_search_request(RawQuery(None), &api()).unwrap();
        assert_eq!(request.page, 1);
        assert_eq!(request.page_size, 5);
        assert!(request.sort_by_and_order.is_empty());
        assert!(request.search_criteria.is_empty());
    }

    #[test]
    fn test_repeated_and_encoded_parameters() {
        let request = parse(
            "page=2&pageSize=10&sortByAndOrder=title:ASC&sortByAndOrder=createdDate:desc\
             &searchCriteria=title%3Alike%3AJava+news&searchCriteria=author:EQ:Gosling",
        )
        .unwrap();

        assert_eq!(request.page, 2);
        assert_eq!(request.page_size, 10);
        assert_eq!(request.sort_by_and_order, vec!["title:ASC", "createdDate:desc"]);
        assert_eq!(
            request.search_criteria,
            vec!["title:like:Java news", "author:EQ:Gosling"]
        );
    }

    #[test]
    fn test_comma_separated_sort() {
        let request = parse("sortByAndOrder=title:ASC,%20id:DESC").unwrap();
        assert_eq!(request.sort_by_and_order, vec!["title:ASC", "id:DESC"]);
    }

    #[test]
    fn test_out_of_range_paging_is_rejected() {
        for query in ["page=0", "pageSize=0", "pageSize=101", "page=abc", "pageSize=-3"] {
            let err = parse(query).unwrap_err();
            assert_eq!(err.error.code, "000013", "query {query}");
        }
        assert!(parse("pageSize=100").is_ok());
    }
}
