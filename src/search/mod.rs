//! Search, sort and pagination
//!
//! - `criteria`: the typed criteria model and the result `Page`
//! - `mapper`: per-entity translation of raw request tokens into criteria
//!
//! The query builder that executes a `SearchCriteria` lives in `db::query`.

pub mod criteria;
pub mod mapper;

pub use criteria::{
    page_count, Page, Pagination, SearchCriteria, SearchCriterion, SearchOperation, SortOrder,
    Sorting,
};
pub use mapper::{
    AuthorSearchFilterMapper, CommentSearchFilterMapper, NewsSearchFilterMapper,
    SearchFilterMapper, TagSearchFilterMapper,
};

/// Raw list parameters as they arrive from a client
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    pub page: u32,
    pub page_size: u32,
    /// `field:ORDER` tokens
    pub sort_by_and_order: Vec<String>,
    /// `field:operator:value` tokens
    pub search_criteria: Vec<String>,
}

/// Malformed sort or filter input
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SearchError {
    #[error("Invalid sort parameter '{0}', expected field:ASC or field:DESC")]
    InvalidSortToken(String),

    #[error("Unknown sort order '{0}', expected ASC or DESC")]
    UnknownSortOrder(String),

    #[error("Unknown search operation '{0}'")]
    UnknownOperator(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("Invalid value '{value}' for field '{field}': {reason}")]
    InvalidValue {
        field: String,
        value: String,
        reason: String,
    },
}
