//! Comment model
//!
//! A comment always belongs to exactly one news item. Its lifecycle is bound
//! to that news item: deleting the news deletes its comments.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Comment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    /// Unique identifier
    pub id: i64,
    /// Comment body
    pub content: String,
    /// Parent news ID
    pub news_id: i64,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Comment {
    /// Create a new comment that has not been persisted yet
    pub fn new(content: String, news_id: i64) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            content,
            news_id,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating a comment
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCommentInput {
    pub content: String,
    pub news_id: i64,
}

/// Input for updating a comment
///
/// Only the content can change; a comment never moves to another news item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCommentInput {
    #[serde(default)]
    pub content: Option<String>,
}
