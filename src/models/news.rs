//! News model
//!
//! This module provides:
//! - `News` entity as stored, referencing its author by ID
//! - `NewsDetails`, a news item joined with its author, tags and comments
//! - Input types for creating and updating news
//!
//! Authors and tags are referenced by name in the inputs. Names that do not
//! exist yet are created on the fly by the news service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Author, Comment, Tag};

/// News entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct News {
    /// Unique identifier
    pub id: i64,
    /// Headline
    pub title: String,
    /// Body text
    pub content: String,
    /// Author ID; every news item has exactly one author
    pub author_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl News {
    /// Create a new news item that has not been persisted yet
    pub fn new(title: String, content: String, author_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            title,
            content,
            author_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// A news item with its relations resolved
#[derive(Debug, Clone, Serialize)]
pub struct NewsDetails {
    pub news: News,
    pub author: Author,
    pub tags: Vec<Tag>,
    pub comments: Vec<Comment>,
}

/// Input for creating a news item
#[derive(Debug, Clone, Deserialize)]
pub struct CreateNewsInput {
    pub title: String,
    pub content: String,
    /// Author name, created if unknown
    pub author: String,
    /// Tag names, each created if unknown
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for updating a news item
///
/// Blank or missing `title`/`content`/`author` keep the current value.
/// `tags`, when present, replaces the whole tag set; when absent the tags
/// are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateNewsInput {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
}
