//! Author repository
//!
//! Database operations for authors.
//!
//! This module provides:
//! - `AuthorRepository` trait defining the interface for author data access
//! - `SqlxAuthorRepository` implementing the trait for SQLite

use crate::db::query::{fetch_page, CompiledQuery, Field, SearchableEntity};
use crate::models::Author;
use crate::search::Page;
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row, SqliteConnection};
use std::sync::Arc;

/// Author repository trait
#[async_trait]
pub trait AuthorRepository: Send + Sync {
    /// Insert a new author; timestamps are assigned here
    async fn create(&self, conn: &mut SqliteConnection, author: &Author) -> Result<Author>;

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Author>>;

    async fn read_by_name(&self, conn: &mut SqliteConnection, name: &str) -> Result<Option<Author>>;

    /// Author of the given news item
    async fn read_by_news_id(
        &self,
        conn: &mut SqliteConnection,
        news_id: i64,
    ) -> Result<Option<Author>>;

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    /// Persist the name and refresh `updated_at`
    async fn update(&self, conn: &mut SqliteConnection, author: &Author) -> Result<Author>;

    /// Returns false when no row was deleted
    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool>;

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<Author>>;
}

/// SQLx-based author repository implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlxAuthorRepository;

impl SqlxAuthorRepository {
    pub fn new() -> Self {
        Self
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed() -> Arc<dyn AuthorRepository> {
        Arc::new(Self::new())
    }
}

impl SearchableEntity for Author {
    const TABLE: &'static str = "authors";
    const COLUMNS: &'static str = "id, name, created_at, updated_at";
    const FIELDS: &'static [(&'static str, Field)] = &[
        ("id", Field::integer("id")),
        ("name", Field::text("name")),
        ("createdDate", Field::timestamp("created_at")),
        ("lastUpdatedDate", Field::timestamp("updated_at")),
    ];

    fn from_row(row: &SqliteRow) -> Result<Self> {
        row_to_author_sqlite(row)
    }
}

#[async_trait]
impl AuthorRepository for SqlxAuthorRepository {
    async fn create(&self, conn: &mut SqliteConnection, author: &Author) -> Result<Author> {
        let now = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO authors (name, created_at, updated_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(&author.name)
        .bind(now)
        .bind(now)
        .execute(&mut *conn)
        .await
        .context("Failed to create author")?;

        Ok(Author {
            id: result.last_insert_rowid(),
            name: author.name.clone(),
            created_at: now,
            updated_at: now,
        })
    }

    async fn read_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<Option<Author>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM authors
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get author by ID")?;

        row.as_ref().map(row_to_author_sqlite).transpose()
    }

    async fn read_by_name(&self, conn: &mut SqliteConnection, name: &str) -> Result<Option<Author>> {
        let row = sqlx::query(
            r#"
            SELECT id, name, created_at, updated_at
            FROM authors
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get author by name")?;

        row.as_ref().map(row_to_author_sqlite).transpose()
    }

    async fn read_by_news_id(
        &self,
        conn: &mut SqliteConnection,
        news_id: i64,
    ) -> Result<Option<Author>> {
        let row = sqlx::query(
            r#"
            SELECT a.id, a.name, a.created_at, a.updated_at
            FROM authors a
            INNER JOIN news n ON n.author_id = a.id
            WHERE n.id = ?
            "#,
        )
        .bind(news_id)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to get author by news ID")?;

        row.as_ref().map(row_to_author_sqlite).transpose()
    }

    async fn exists_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM authors WHERE id = ?")
            .bind(id)
            .fetch_one(&mut *conn)
            .await
            .context("Failed to check author existence")?;

        let count: i64 = row.get("count");
        Ok(count > 0)
    }

    async fn update(&self, conn: &mut SqliteConnection, author: &Author) -> Result<Author> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE authors
            SET name = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&author.name)
        .bind(now)
        .bind(author.id)
        .execute(&mut *conn)
        .await
        .context("Failed to update author")?;

        Ok(Author {
            updated_at: now,
            ..author.clone()
        })
    }

    async fn delete_by_id(&self, conn: &mut SqliteConnection, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM authors WHERE id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await
            .context("Failed to delete author")?;

        Ok(result.rows_affected() > 0)
    }

    async fn search(&self, conn: &mut SqliteConnection, query: &CompiledQuery) -> Result<Page<Author>> {
        fetch_page(conn, query).await
    }
}

fn row_to_author_sqlite(row: &SqliteRow) -> Result<Author> {
    Ok(Author {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
