//! News repository
//!
//! Database operations for news items and their tag links.
//!
//! This module provides:
//! - `NewsRepository` trait defining the interface for news data access
//! - `SqlxNewsRepository` implementing the trait for SQLite
//!
//! Searchable fields include `author`, which filters and sorts on the
//! author's name through a correlated subquery.

use crate::db::query::{fetch_page, CompiledQuery, Field, SearchableEntity};
use crate::models::News;
use crate::search::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use std::sync::Arc;

/// News repository trait
#[async_trait]
pub trait NewsRepository: Send + Sync {
    /// Insert a new news item; timestamps are assigned here
    async fn create(&self, conn: &mut SqliteConnection, news: &News) -> Result<News>;

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<News>>;

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    /// Persist title, content and author, refreshing `updated_at`
    async fn update(&self, conn: &mut SqliteConnection, news: &News) -> Result<News>;

    /// Removes the news item with its tag links and comments; tags and author stay
    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    /// Replace the tag set of a news item, keeping the given order
    async fn set_tags(&self, conn: &mut SqliteConnection, news_id: i64, tag_ids: &[i64]) -> Result<()>;

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<News>>;
}

/// SQLx-based news repository implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxNewsRepository;

impl SqlxNewsRepository {
    pub fn new() -> Self {
        Self
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn NewsRepository> {
        Arc::new(Self::new())
    }
}

impl SearchableEntity for News {
    const TABLE: &'static str = "news";
    const COLUMNS: &'static str = "id, title, content, author_id, created_at, updated_at";
    const FIELDS: &'static [(&'static str, Field)] = &[
        ("id", Field::integer("id")),
        ("title", Field::text("title")),
        ("content", Field::text("content")),
        ("authorId", Field::integer("author_id")),
        (
            "author",
            Field::text("(SELECT a.name FROM authors a WHERE a.id = news.author_id)"),
        ),
        ("createdDate", Field::timestamp("created_at")),
        ("lastUpdatedDate", Field::timestamp("updated_at")),
    ];

    fn from_row(row: &SqliteRow) -> Result<Self> {
        row_to_news_sqlite(row)
    }
}

#[async_trait]
impl NewsRepository for SqlxNewsRepository {
    async fn create(&self, conn: &mut SqliteConnection, news: &News) -> Result<News> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO news (title, content, author_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&news.title)
        .bind(&news.content)
        .bind(news.author_id)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .context("Failed to create news")?;

        Ok(News {
            id: result.last_insert_rowid(),
            title: news.title.clone(),
            content: news.content.clone(),
            author_id: news.author_id,
            created_at: now,
            updated_at: now,
        })
    }

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<News>> {
        let row = sqlx::query(
            r#"
            SELECT id, title, content, author_id, created_at, updated_at
            FROM news
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get news by ID")?;

        row.as_ref().map(row_to_news_sqlite).transpose()
    }

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM news WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check news existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn update(&self, conn: &mut SqliteConnection, news: &News) -> Result<News> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE news
            SET title = ?, content = ?, author_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&news.title)
        .bind(&news.content)
        .bind(news.author_id)
        .bind(now)
        .bind(news.id)
        .execute(&mut *conn)
        .await
        .context("Failed to update news")?;

        Ok(News {
            updated_at: now,
            ..news.clone()
        })
    }

    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM news WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to delete news")?;

        Ok(result.rows_affected() > 0)
    }

    async fn set_tags(&self, conn: &mut SqliteConnection, news_id: i64, tag_ids: &[i64]) -> Result<()> {
        sqlx::query("DELETE FROM news_tags WHERE news_id = ?")
            .bind(news_id)
            .execute(&mut *conn)
            .await
            .context("Failed to detach tags from news")?;

        for (position, tag_id) in tag_ids.iter().enumerate() {
            sqlx::query("INSERT INTO news_tags (news_id, tag_id, position) VALUES (?, ?, ?)")
                .bind(news_id)
                .bind(tag_id)
                .bind(position as i64)
                .execute(&mut *conn)
                .await
                .context("Failed to attach tag to news")?;
        }

        Ok(())
    }

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<News>> {
        fetch_page(conn, query).await
    }
}

fn row_to_news_sqlite(row: &SqliteRow) -> Result<News> {
    Ok(News {
        id: row.try_get("id")?,
        title: row.try_get("title")?,
        content: row.try_get("content")?,
        author_id: row.try_get("author_id")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
