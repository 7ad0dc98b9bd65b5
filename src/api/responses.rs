//! Shared API response types
//!
//! Every entity response carries a `_links` map keyed by relation name.
//! Links are absolute and point at the API version the client used.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::models::{Author, Comment, NewsDetails, Tag};
use crate::search::{Page, SearchRequest};

/// A single hypermedia link
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Link {
    pub href: String,
}

pub type Links = BTreeMap<&'static str, Link>;

// ============================================================================
// Link Building
// ============================================================================

/// Builds absolute links below `{public_url}/api/v{version}`
#[derive(Debug, Clone)]
pub struct LinkBuilder {
    root: String,
}

impl LinkBuilder {
    pub fn new(public_url: &str, version: u32) -> Self {
        Self {
            root: format!("{}/api/v{}", public_url.trim_end_matches('/'), version),
        }
    }

    pub fn collection(&self, resource: &str) -> String {
        format!("{}/{}", self.root, resource)
    }

    pub fn item(&self, resource: &str, id: i64) -> String {
        format!("{}/{}/{}", self.root, resource, id)
    }

    pub fn nested(&self, resource: &str, id: i64, relation: &str) -> String {
        format!("{}/{}/{}/{}", self.root, resource, id, relation)
    }

    /// `self`, `update`, `delete` and the collection link of one entity
    pub fn entity_links(&self, resource: &'static str, id: i64) -> Links {
        let href = self.item(resource, id);
        let mut links = Links::new();
        links.insert("self", Link { href: href.clone() });
        links.insert("update", Link { href: href.clone() });
        links.insert("delete", Link { href });
        links.insert(
            resource,
            Link {
                href: self.collection(resource),
            },
        );
        links
    }

    /// Navigation links of a result page
    ///
    /// `prev` and `next` are present only when that page exists; past the end,
    /// `prev` points at the last page. Every link repeats the page size, sort
    /// and filter parameters of the request.
    pub fn page_links(&self, resource: &str, request: &SearchRequest, page_count: u32) -> Links {
        let current = request.page;
        let last = page_count.max(1);
        let base = self.collection(resource);
        let link = |page: u32| Link {
            href: format!("{}?{}", base, page_query(request, page)),
        };

        let mut links = Links::new();
        links.insert("self", link(current));
        links.insert("first", link(1));
        links.insert("last", link(last));
        if current > 1 {
            links.insert("prev", link((current - 1).min(last)));
        }
        if current < page_count {
            links.insert("next", link(current + 1));
        }
        links
    }
}

fn page_query(request: &SearchRequest, page: u32) -> String {
    let mut params = vec![
        format!("page={}", page),
        format!("pageSize={}", request.page_size),
    ];
    params.extend(
        request
            .sort_by_and_order
            .iter()
            .map(|s| format!("sortByAndOrder={}", urlencoding::encode(s))),
    );
    params.extend(
        request
            .search_criteria
            .iter()
            .map(|c| format!("searchCriteria={}", urlencoding::encode(c))),
    );
    params.join("&")
}

// ============================================================================
// Entity Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorDto {
    pub id: i64,
    pub name: String,
    pub created_date: String,
    pub last_updated_date: String,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl AuthorDto {
    pub fn new(author: Author, links: &LinkBuilder) -> Self {
        Self {
            links: links.entity_links("authors", author.id),
            id: author.id,
            name: author.name,
            created_date: author.created_at.to_rfc3339(),
            last_updated_date: author.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TagDto {
    pub id: i64,
    pub name: String,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl TagDto {
    pub fn new(tag: Tag, links: &LinkBuilder) -> Self {
        Self {
            links: links.entity_links("tags", tag.id),
            id: tag.id,
            name: tag.name,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentDto {
    pub id: i64,
    pub content: String,
    pub news_id: i64,
    pub created_date: String,
    pub last_updated_date: String,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl CommentDto {
    pub fn new(comment: Comment, links: &LinkBuilder) -> Self {
        let mut entity_links = links.entity_links("comments", comment.id);
        entity_links.insert(
            "news",
            Link {
                href: links.item("news", comment.news_id),
            },
        );
        Self {
            links: entity_links,
            id: comment.id,
            content: comment.content,
            news_id: comment.news_id,
            created_date: comment.created_at.to_rfc3339(),
            last_updated_date: comment.updated_at.to_rfc3339(),
        }
    }
}

/// News with its author, tags and comments embedded
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsDto {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created_date: String,
    pub last_updated_date: String,
    pub author_dto: AuthorDto,
    pub tags_dto: Vec<TagDto>,
    pub comments_dto: Vec<CommentDto>,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl NewsDto {
    pub fn new(details: NewsDetails, links: &LinkBuilder) -> Self {
        let NewsDetails {
            news,
            author,
            tags,
            comments,
        } = details;

        let mut news_links = links.entity_links("news", news.id);
        for relation in ["author", "tags", "comments"] {
            news_links.insert(
                relation,
                Link {
                    href: links.nested("news", news.id, relation),
                },
            );
        }

        Self {
            links: news_links,
            id: news.id,
            title: news.title,
            content: news.content,
            created_date: news.created_at.to_rfc3339(),
            last_updated_date: news.updated_at.to_rfc3339(),
            author_dto: AuthorDto::new(author, links),
            tags_dto: tags.into_iter().map(|t| TagDto::new(t, links)).collect(),
            comments_dto: comments
                .into_iter()
                .map(|c| CommentDto::new(c, links))
                .collect(),
        }
    }
}

// ============================================================================
// Pagination Response Types
// ============================================================================

/// One page of DTOs with navigation links
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageDto<T> {
    pub model_dto_list: Vec<T>,
    pub current_page: u32,
    pub page_count: u32,
    #[serde(rename = "_links")]
    pub links: Links,
}

impl<T> PageDto<T> {
    /// Convert a service page, attaching page links for `resource`
    pub fn new<E>(
        page: Page<E>,
        resource: &str,
        request: &SearchRequest,
        links: &LinkBuilder,
        to_dto: impl Fn(E, &LinkBuilder) -> T,
    ) -> Self {
        Self {
            links: links.page_links(resource, request, page.page_count),
            current_page: page.current_page,
            page_count: page.page_count,
            model_dto_list: page
                .entities
                .into_iter()
                .map(|e| to_dto(e, links))
                .collect(),
        }
    }
}
