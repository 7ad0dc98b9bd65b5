//! Comment repository
//!
//! Database operations for comments.
//!
//! This module provides:
//! - `CommentRepository` trait defining the interface for comment data access
//! - `SqlxCommentRepository` implementing the trait for SQLite

use crate::db::query::{fetch_page, CompiledQuery, Field, SearchableEntity};
use crate::models::Comment;
use crate::search::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use std::sync::Arc;

/// Comment repository trait
#[async_trait]
pub trait CommentRepository: Send + Sync {
    async fn create(&self, conn: &mut SqliteConnection, comment: &Comment) -> Result<Comment>;

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Comment>>;

    /// Comments of a news item, newest first
    async fn read_by_news_id(&self, conn: &mut SqliteConnection, news_id: i64) -> Result<Vec<Comment>>;

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    /// Persist the content and refresh `updated_at`
    async fn update(&self, conn: &mut SqliteConnection, comment: &Comment) -> Result<Comment>;

    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<Comment>>;
}

/// SQLx-based comment repository implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxCommentRepository;

impl SqlxCommentRepository {
    pub fn new() -> Self {
        Self
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn CommentRepository> {
        Arc::new(Self::new())
    }
}

impl SearchableEntity for Comment {
    const TABLE: &'static str = "comments";
    const COLUMNS: &'static str = "id, content, news_id, created_at, updated_at";
    const FIELDS: &'static [(&'static str, Field)] = &[
        ("id", Field::integer("id")),
        ("content", Field::text("content")),
        ("newsId", Field::integer("news_id")),
        ("createdDate", Field::timestamp("created_at")),
        ("lastUpdatedDate", Field::timestamp("updated_at")),
    ];

    fn from_row(row: &SqliteRow) -> Result<Self> {
        row_to_comment_sqlite(row)
    }
}

#[async_trait]
impl CommentRepository for SqlxCommentRepository {
    async fn create(&self, conn: &mut SqliteConnection, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO comments (content, news_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&comment.content)
        .bind(comment.news_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .context("Failed to create comment")?;

        Ok(Comment {
            id: result.last_insert_rowid(),
            content: comment.content.clone(),
            news_id: comment.news_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Comment>> {
        let row = sqlx::query(
            r#"
            SELECT id, content, news_id, created_at, updated_at
            FROM comments
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get comment by ID")?;

        row.as_ref().map(row_to_comment_sqlite).transpose()
    }

    async fn read_by_news_id(&self, conn: &mut SqliteConnection, news_id: i64) -> Result<Vec<Comment>> {
        let rows = sqlx::query(
            r#"
            SELECT id, content, news_id, created_at, updated_at
            FROM comments
            WHERE news_id = ?
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(news_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to get comments for news")?;

        rows.iter().map(row_to_comment_sqlite).collect()
    }

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM comments WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check comment existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn update(&self, conn: &mut SqliteConnection, comment: &Comment) -> Result<Comment> {
        let now = Utc::now();

        sqlx::query("UPDATE comments SET content = ?, updated_at = ? WHERE id = ?")
            .bind(&comment.content)
            .bind(now)
            .bind(comment.id)
            .execute(&mut *conn)
            .await
            .context("Failed to update comment")?;

        Ok(Comment {
            updated_at: now,
            ..comment.clone()
        })
    }

    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to delete comment")?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<Comment>> {
        fetch_page(conn, query).await
    }
}

fn row_to_comment_sqlite(row: &SqliteRow) -> Result<Comment> {
    Ok(Comment {
        id: row.try_get("id")?,
        content: row.try_get("content")?,
        news_id: row.try_get("news_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
