//! Filter mappers
//!
//! Turn raw list parameters into a `SearchCriteria`:
//! - sort tokens `field:ORDER` (order is ASC or DESC, any case)
//! - filter tokens `field:operator:value`
//!
//! Each entity has its own mapper carrying its default sort, applied as a
//! whole when the request names no sort key. Filter tokens that do not split
//! into exactly three non-trailing-empty parts are dropped.

use super::criteria::{Pagination, SearchCriteria, SearchCriterion, SearchOperation, Sorting};
use super::{SearchError, SearchRequest};

/// Per-entity translation of raw list parameters
pub trait SearchFilterMapper: Send + Sync {
    /// Sort applied when the request names none
    fn default_sorting(&self) -> Vec<Sorting>;

    /// Build the criteria model for a request
    fn map(&self, request: &SearchRequest) -> Result<SearchCriteria, SearchError> {
        let sorting = if request.sort_by_and_order.is_empty() {
            self.default_sorting()
        } else {
            request
                .sort_by_and_order
                .iter()
                .map(|token| parse_sorting(token))
                .collect::<Result<Vec<_>, _>>()?
        };

        let mut criteria = Vec::with_capacity(request.search_criteria.len());
        for token in &request.search_criteria {
            if let Some(criterion) = parse_criterion(token)? {
                criteria.push(criterion);
            }
        }

        Ok(SearchCriteria {
            pagination: Pagination::new(request.page, request.page_size),
            sorting,
            criteria,
        })
    }
}

/// Parse `field:ORDER`
pub fn parse_sorting(token: &str) -> Result<Sorting, SearchError> {
    let parts: Vec<&str> = token.split(':').collect();
    match parts.as_slice() {
        [field, order] if !field.trim().is_empty() => {
            Ok(Sorting::new(field.trim(), order.parse()?))
        }
        _ => Err(SearchError::InvalidSortToken(token.to_string())),
    }
}

/// Parse `field:operator:value`; `Ok(None)` for a malformed token
///
/// Trailing empty segments do not count as parts, so `title:eq:` is
/// malformed rather than a filter on the empty string.
pub fn parse_criterion(token: &str) -> Result<Option<SearchCriterion>, SearchError> {
    let mut parts: Vec<&str> = token.split(':').collect();
    while parts.last().is_some_and(|part| part.is_empty()) {
        parts.pop();
    }
    let [field, operation, value] = parts.as_slice() else {
        tracing::debug!("Dropping malformed search criterion: {}", token);
        return Ok(None);
    };

    let operation = SearchOperation::from_name(operation)?;
    Ok(Some(SearchCriterion::new(field.trim(), operation, *value)))
}

/// News: title ascending, then newest first
#[derive(Debug, Default, Clone, Copy)]
pub struct NewsSearchFilterMapper;

impl SearchFilterMapper for NewsSearchFilterMapper {
    fn default_sorting(&self) -> Vec<Sorting> {
        vec![Sorting::asc("title"), Sorting::desc("createdDate")]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct AuthorSearchFilterMapper;

impl SearchFilterMapper for AuthorSearchFilterMapper {
    fn default_sorting(&self) -> Vec<Sorting> {
        vec![Sorting::asc("name")]
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct TagSearchFilterMapper;

impl SearchFilterMapper for TagSearchFilterMapper {
    fn default_sorting(&self) -> Vec<Sorting> {
        vec![Sorting::asc("name")]
    }
}

/// Comments: newest first
#[derive(Debug, Default, Clone, Copy)]
pub struct CommentSearchFilterMapper;

impl SearchFilterMapper for CommentSearchFilterMapper {
    fn default_sorting(&self) -> Vec<Sorting> {
        vec![Sorting::desc("createdDate")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::criteria::SortOrder;
    use proptest::prelude::*;

    fn request(sorts: &[&str], filters: &[&str]) -> SearchRequest {
        SearchRequest {
            page: 2,
            page_size: 7,
            sort_by_and_order: sorts.iter().map(|s| s.to_string()).collect(),
            search_criteria: filters.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_default_sorting_per_entity() {
        let empty = request(&[], &[]);

        let news = NewsSearchFilterMapper.map(&empty).unwrap();
        assert_eq!(
            news.sorting,
            vec![Sorting::asc("title"), Sorting::desc("createdDate")]
        );
        assert_eq!(
            AuthorSearchFilterMapper.map(&empty).unwrap().sorting,
            vec![Sorting::asc("name")]
        );
        assert_eq!(
            TagSearchFilterMapper.map(&empty).unwrap().sorting,
            vec![Sorting::asc("name")]
        );
        assert_eq!(
            CommentSearchFilterMapper.map(&empty).unwrap().sorting,
            vec![Sorting::desc("createdDate")]
        );
    }

    #[test]
    fn test_explicit_sort_replaces_default() {
        let criteria = NewsSearchFilterMapper
            .map(&request(&["content:desc", "id:Asc"], &[]))
            .unwrap();

        assert_eq!(
            criteria.sorting,
            vec![Sorting::desc("content"), Sorting::asc("id")]
        );
    }

    #[test]
    fn test_pagination_is_copied() {
        let criteria = TagSearchFilterMapper.map(&request(&[], &[])).unwrap();
        assert_eq!(criteria.pagination, Pagination::new(2, 7));
    }

    #[test]
    fn test_unknown_sort_order_is_rejected() {
        let result = AuthorSearchFilterMapper.map(&request(&["name:sideways"], &[]));
        assert!(matches!(result, Err(SearchError::UnknownSortOrder(_))));
    }

    #[test]
    fn test_sort_token_without_order_is_rejected() {
        let result = AuthorSearchFilterMapper.map(&request(&["name"], &[]));
        assert!(matches!(result, Err(SearchError::InvalidSortToken(_))));
    }

    #[test]
    fn test_filters_are_parsed() {
        let criteria = NewsSearchFilterMapper
            .map(&request(&[], &["title:like:Java", "authorId:eq:3"]))
            .unwrap();

        assert_eq!(
            criteria.criteria,
            vec![
                SearchCriterion::new("title", SearchOperation::Like, "Java"),
                SearchCriterion::new("authorId", SearchOperation::Equal, "3"),
            ]
        );
    }

    #[test]
    fn test_malformed_filters_are_dropped() {
        let criteria = NewsSearchFilterMapper
            .map(&request(&[], &["title:Java", "title:eq:a:b", "", "title:eq:Java"]))
            .unwrap();

        assert_eq!(
            criteria.criteria,
            vec![SearchCriterion::new("title", SearchOperation::Equal, "Java")]
        );
    }

    #[test]
    fn test_filters_with_empty_trailing_parts_are_dropped() {
        let criteria = NewsSearchFilterMapper
            .map(&request(&[], &["title:eq:", "title:eq::", "title:like:Java"]))
            .unwrap();

        assert_eq!(
            criteria.criteria,
            vec![SearchCriterion::new("title", SearchOperation::Like, "Java")]
        );
    }

    #[test]
    fn test_unknown_operator_is_rejected() {
        let result = NewsSearchFilterMapper.map(&request(&[], &["title:between:Java"]));
        assert!(matches!(result, Err(SearchError::UnknownOperator(_))));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(20))]

        /// Any token with a colon count other than two never becomes a criterion.
        #[test]
        fn tokens_without_three_parts_are_ignored(parts in prop::collection::vec("[a-z]{1,6}", 1..6)) {
            prop_assume!(parts.len() != 3);
            let token = parts.join(":");
            let criteria = CommentSearchFilterMapper
                .map(&request(&[], &[token.as_str()]))
                .unwrap();
            prop_assert!(criteria.criteria.is_empty());
        }

        /// A valid sort token keeps its field and resolves its order regardless of case.
        #[test]
        fn sort_tokens_roundtrip(field in "[a-zA-Z]{1,12}", desc in any::<bool>(), upper in any::<bool>()) {
            let order = match (desc, upper) {
                (true, true) => "DESC",
                (true, false) => "desc",
                (false, true) => "ASC",
                (false, false) => "asc",
            };
            let sorting = parse_sorting(&format!("{}:{}", field, order)).unwrap();
            prop_assert_eq!(sorting.field, field);
            prop_assert_eq!(sorting.order, if desc { SortOrder::Desc } else { SortOrder::Asc });
        }
    }
}
