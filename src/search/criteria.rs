//! Search criteria model
//!
//! Value objects describing one page request: which page, how it is sorted
//! and which filters narrow it down. Construction never fails; bounds on
//! `page`/`page_size` are enforced where the request enters the system.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::SearchError;

// ============================================================================
// Pagination
// ============================================================================

/// 1-based page request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
}

impl Pagination {
    pub fn new(page: u32, page_size: u32) -> Self {
        Self { page, page_size }
    }

    /// Row offset of the first entity on this page
    pub fn offset(&self) -> i64 {
        i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.page_size)
    }
}

// ============================================================================
// Sorting
// ============================================================================

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl FromStr for SortOrder {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(SearchError::UnknownSortOrder(s.to_string())),
        }
    }
}

/// One sort key; a list of these is applied in order, first entry primary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sorting {
    pub field: String,
    pub order: SortOrder,
}

impl Sorting {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortOrder::Desc)
    }
}

// ============================================================================
// Filtering
// ============================================================================

/// Closed set of filter operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchOperation {
    Equal,
    NotEqual,
    Like,
    GreaterThan,
    GreaterThanOrEqual,
    LessThan,
    LessThanOrEqual,
}

static OPERATIONS_BY_NAME: Lazy<HashMap<&'static str, SearchOperation>> = Lazy::new(|| {
    HashMap::from([
        ("EQUAL", SearchOperation::Equal),
        ("EQ", SearchOperation::Equal),
        ("NOT_EQUAL", SearchOperation::NotEqual),
        ("NE", SearchOperation::NotEqual),
        ("LIKE", SearchOperation::Like),
        ("CONTAINS", SearchOperation::Like),
        ("GREATER_THAN", SearchOperation::GreaterThan),
        ("GT", SearchOperation::GreaterThan),
        ("GREATER_THAN_OR_EQUAL", SearchOperation::GreaterThanOrEqual),
        ("GTE", SearchOperation::GreaterThanOrEqual),
        ("LESS_THAN", SearchOperation::LessThan),
        ("LT", SearchOperation::LessThan),
        ("LESS_THAN_OR_EQUAL", SearchOperation::LessThanOrEqual),
        ("LTE", SearchOperation::LessThanOrEqual),
    ])
});

impl SearchOperation {
    /// Resolve an operator by name, ignoring case
    pub fn from_name(name: &str) -> Result<Self, SearchError> {
        OPERATIONS_BY_NAME
            .get(name.trim().to_ascii_uppercase().as_str())
            .copied()
            .ok_or_else(|| SearchError::UnknownOperator(name.to_string()))
    }

    /// SQL comparison operator for this operation
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "<>",
            Self::Like => "LIKE",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
        }
    }
}

/// One `field operator value` predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriterion {
    pub field: String,
    pub operation: SearchOperation,
    pub value: String,
}

impl SearchCriterion {
    pub fn new(field: impl Into<String>, operation: SearchOperation, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            operation,
            value: value.into(),
        }
    }
}

/// Full criteria model for one list request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub pagination: Pagination,
    pub sorting: Vec<Sorting>,
    pub criteria: Vec<SearchCriterion>,
}

// ============================================================================
// Result page
// ============================================================================

/// One page of results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub entities: Vec<T>,
    pub current_page: u32,
    pub page_count: u32,
}

impl<T> Page<T> {
    pub fn new(entities: Vec<T>, current_page: u32, page_count: u32) -> Self {
        Self {
            entities,
            current_page,
            page_count,
        }
    }

    /// Convert every entity, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            entities: self.entities.into_iter().map(f).collect(),
            current_page: self.current_page,
            page_count: self.page_count,
        }
    }
}

/// `ceil(total / page_size)`, 0 when nothing matched
pub fn page_count(total: u64, page_size: u32) -> u32 {
    if page_size == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(page_size));
    u32::try_from(pages).unwrap_or(u32::MAX)
}
