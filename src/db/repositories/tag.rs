//! Tag repository
//!
//! Database operations for tags and their links to news.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite

use crate::db::query::{fetch_page, CompiledQuery, Field, SearchableEntity};
use crate::models::Tag;
use crate::search::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    async fn create(&self, conn: &mut SqliteConnection, tag: &Tag) -> Result<Tag>;

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Tag>>;

    async fn read_by_name(&self, conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>>;

    /// Tags of a news item, in the order they were attached
    async fn read_by_news_id(&self, conn: &mut SqliteConnection, news_id: i64) -> Result<Vec<Tag>>;

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    async fn update(&self, conn: &mut SqliteConnection, tag: &Tag) -> Result<Tag>;

    /// Removes the tag and detaches it from every news item
    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<Tag>>;
}

/// SQLx-based tag repository implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxTagRepository;

impl SqlxTagRepository {
    pub fn new() -> Self {
        Self
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn TagRepository> {
        Arc::new(Self::new())
    }
}

impl SearchableEntity for Tag {
    const TABLE: &'static str = "tags";
    const COLUMNS: &'static str = "id, name";
    const FIELDS: &'static [(&'static str, Field)] = &[
        ("id", Field::integer("id")),
        ("name", Field::text("name")),
    ];

    fn from_row(row: &SqliteRow) -> Result<Self> {
        row_to_tag_sqlite(row)
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, conn: &mut SqliteConnection, tag: &Tag) -> Result<Tag> {
        let result = sqlx::query("INSERT INTO tags (name) VALUES (?)")
            .bind(&tag.name)
            .execute(&mut *conn)
            .await
            .context("Failed to create tag")?;

        Ok(Tag {
            id: result.last_insert_rowid(),
            name: tag.name.clone(),
        })
    }

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to get tag by ID")?;

        row.as_ref().map(row_to_tag_sqlite).transpose()
    }

    async fn read_by_name(&self, conn: &mut SqliteConnection, name: &str) -> Result<Option<Tag>> {
        let row = sqlx::query("SELECT id, name FROM tags WHERE name = ?")
            .bind(name)
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to get tag by name")?;

        row.as_ref().map(row_to_tag_sqlite).transpose()
    }

    async fn read_by_news_id(&self, conn: &mut SqliteConnection, news_id: i64) -> Result<Vec<Tag>> {
        let rows = sqlx::query(
            r#"
            SELECT t.id, t.name
            FROM tags t
            INNER JOIN news_tags nt ON t.id = nt.tag_id
            WHERE nt.news_id = ?
            ORDER BY nt.position, t.id
            "#,
        )
        .bind(news_id)
        .fetch_all(&mut *conn)
        .await
        .context("Failed to get tags for news")?;

        rows.iter().map(row_to_tag_sqlite).collect()
    }

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM tags WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check tag existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn update(&self, conn: &mut SqliteConnection, tag: &Tag) -> Result<Tag> {
        sqlx::query("UPDATE tags SET name = ? WHERE id = ?")
            .bind(&tag.name)
            .bind(tag.id)
            .execute(&mut *conn)
            .await
            .context("Failed to update tag")?;

        Ok(tag.clone())
    }

    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        // news_tags rows go away through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM tags WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to delete tag")?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<Tag>> {
        fetch_page(conn, query).await
    }
}

fn row_to_tag_sqlite(row: &SqliteRow) -> Result<Tag> {
    Ok(Tag {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}
