//! Database layer
//!
//! SQLite persistence for the newsdesk service.
//!
//! # Architecture
//!
//! - `pool`: the `Database` handle, handing out write transactions and connections
//! - `migrations`: code-embedded schema migrations
//! - `query`: the generic filtered/sorted/paged query builder
//! - `repositories`: per-entity data access
//!
//! Repository methods take a `&mut SqliteConnection`, so a service can run a
//! whole operation inside one transaction and commit once.
//!
//! # Usage
//!
//! ```ignore
//! use newsdesk::config::DatabaseConfig;
//! use newsdesk::db::{create_pool, migrations};
//!
//! let pool = create_pool(&DatabaseConfig::default()).await?;
//! migrations::run_migrations(&pool).await?;
//!
//! let mut tx = pool.begin().await?;
//! // ... repository calls with `&mut *tx`
//! tx.commit().await?;
//! ```

pub mod migrations;
pub mod pool;
pub mod query;
pub mod repositories;

pub use pool::{create_pool, create_test_pool, Database, WriteTransaction};

/// Check whether an error chain carries a SQLite UNIQUE constraint violation
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    database_error_matches(err, |db| db.is_unique_violation())
}

/// Check whether an error chain carries a SQLite FOREIGN KEY constraint violation
pub fn is_foreign_key_violation(err: &anyhow::Error) -> bool {
    database_error_matches(err, |db| db.is_foreign_key_violation())
}

fn database_error_matches(
    err: &anyhow::Error,
    check: impl Fn(&dyn sqlx::error::DatabaseError) -> bool,
) -> bool {
    err.chain().any(|cause| match cause.downcast_ref::<sqlx::Error>() {
        Some(sqlx::Error::Database(db)) => check(db.as_ref()),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[tokio::test]
    async fn test_unique_violation_detected_through_context() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.execute("CREATE TABLE names (name TEXT NOT NULL UNIQUE)")
            .await
            .expect("Failed to create table");
        pool.execute("INSERT INTO names (name) VALUES ('dup')")
            .await
            .expect("Failed to insert");

        let err = sqlx::query("INSERT INTO names (name) VALUES ('dup')")
            .execute(pool.pool())
            .await
            .context("Failed to insert name")
            .unwrap_err();

        assert!(is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));
    }

    #[test]
    fn test_plain_error_is_not_a_violation() {
        let err = anyhow::anyhow!("something else");
        assert!(!is_unique_violation(&err));
        assert!(!is_foreign_key_violation(&err));
    }
}
