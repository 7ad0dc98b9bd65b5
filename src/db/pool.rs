//! Database connection pool
//!
//! Wraps a SQLite pool and hands out write transactions and single
//! connections to the service layer. File databases get their parent
//! directory created, are opened in create mode and run in WAL mode with a
//! busy timeout; in-memory databases are pinned to a single connection so
//! every caller sees the same data.

use anyhow::{Context, Result};
use sqlx::{
    pool::PoolConnection,
    sqlite::{SqliteConnectOptions, SqliteConnection, SqliteJournalMode, SqlitePool, SqlitePoolOptions},
    Sqlite,
};
use std::ops::{Deref, DerefMut};
use std::str::FromStr;
use std::time::Duration;

use crate::config::DatabaseConfig;

/// How long a writer waits for the database write lock
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// SQLite connection pool
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Open a SQLite database from a URL, a `:memory:` marker or a plain file path
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = is_memory_url(url);

        if !in_memory {
            let path = url.trim_start_matches("sqlite://").trim_start_matches("sqlite:");
            let path = path.split('?').next().unwrap_or(path);

            if let Some(parent) = std::path::Path::new(path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create database directory: {:?}", parent)
                    })?;
                }
            }
        }

        let connection_url = if in_memory {
            "sqlite::memory:".to_string()
        } else if url.starts_with("sqlite:") {
            url.to_string()
        } else {
            format!("sqlite:{}", url)
        };

        let mut options = SqliteConnectOptions::from_str(&connection_url)
            .with_context(|| format!("Invalid SQLite URL: {}", url))?
            .create_if_missing(true)
            .foreign_keys(true)
            .busy_timeout(BUSY_TIMEOUT);
        if !in_memory {
            options = options.journal_mode(SqliteJournalMode::Wal);
        }

        let mut pool_options = SqlitePoolOptions::new();
        if in_memory {
            // The database lives only as long as its single connection.
            pool_options = pool_options
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None);
        } else {
            pool_options = pool_options.max_connections(max_connections.max(1));
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to connect to SQLite database: {}", url))?;

        Ok(Self { pool })
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a write transaction; dropping it without `commit` rolls back
    ///
    /// The transaction takes the write lock up front (`BEGIN IMMEDIATE`), so
    /// reads inside it see every write committed before it, and concurrent
    /// writers wait for each other instead of failing on lock upgrade.
    pub async fn begin(&self) -> Result<WriteTransaction> {
        let mut conn = self.acquire().await?;
        sqlx::query("BEGIN IMMEDIATE")
            .execute(&mut *conn)
            .await
            .context("Failed to begin transaction")?;
        Ok(WriteTransaction { conn: Some(conn) })
    }

    /// Check out a single connection for read-only work
    pub async fn acquire(&self) -> Result<PoolConnection<Sqlite>> {
        self.pool
            .acquire()
            .await
            .context("Failed to acquire database connection")
    }

    /// Execute a raw SQL statement that doesn't return rows
    pub async fn execute(&self, query: &str) -> Result<u64> {
        let result = sqlx::query(query)
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to execute query: {}", query))?;
        Ok(result.rows_affected())
    }

    /// Check if the database connection is healthy
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("Database ping failed")?;
        Ok(())
    }

    /// Close the connection pool
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// An open `BEGIN IMMEDIATE` transaction on a pooled connection
///
/// Derefs to the connection, so repositories take `&mut *tx`.
pub struct WriteTransaction {
    // Only `commit` and `drop` take the connection out.
    conn: Option<PoolConnection<Sqlite>>,
}

impl WriteTransaction {
    /// Commit and hand the connection back to the pool
    pub async fn commit(mut self) -> Result<()> {
        if let Some(conn) = self.conn.as_mut() {
            sqlx::query("COMMIT")
                .execute(&mut **conn)
                .await
                .context("Failed to commit transaction")?;
        }
        self.conn = None;
        Ok(())
    }
}

impl Deref for WriteTransaction {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        match self.conn.as_deref() {
            Some(conn) => conn,
            None => unreachable!("write transaction used after commit"),
        }
    }
}

impl DerefMut for WriteTransaction {
    fn deref_mut(&mut self) -> &mut Self::Target {
        match self.conn.as_deref_mut() {
            Some(conn) => conn,
            None => unreachable!("write transaction used after commit"),
        }
    }
}

impl Drop for WriteTransaction {
    fn drop(&mut self) {
        let Some(mut conn) = self.conn.take() else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = sqlx::query("ROLLBACK").execute(&mut *conn).await {
                        tracing::warn!("Rollback failed, discarding connection: {}", e);
                        drop(conn.detach());
                    }
                });
            }
            // Without a runtime the rollback cannot run; closing the
            // connection discards the transaction instead.
            Err(_) => drop(conn.detach()),
        }
    }
}

fn is_memory_url(url: &str) -> bool {
    url == ":memory:" || url.starts_with("sqlite::memory:") || url.contains("mode=memory")
}

/// Create a database connection pool based on configuration.
pub async fn create_pool(config: &DatabaseConfig) -> Result<Database> {
    Database::connect(&config.url, config.max_connections).await
}

/// Create a SQLite in-memory database pool for testing
pub async fn create_test_pool() -> Result<Database> {
    let config = DatabaseConfig {
        url: ":memory:".to_string(),
        max_connections: 1,
    };
    create_pool(&config).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sqlite_pool_ping() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");
    }

    #[tokio::test]
    async fn test_sqlite_pool_execute() {
        let pool = create_test_pool().await.expect("Failed to create pool");

        pool.execute("CREATE TABLE test (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");

        let affected = pool
            .execute("INSERT INTO test (name) VALUES ('test')")
            .await
            .expect("Failed to insert");
        assert_eq!(affected, 1);
    }

    #[tokio::test]
    async fn test_memory_database_is_shared_between_checkouts() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.execute("CREATE TABLE shared (id INTEGER PRIMARY KEY)")
            .await
            .expect("Failed to create table");

        let mut conn = pool.acquire().await.expect("Failed to acquire");
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM shared")
            .fetch_one(&mut *conn)
            .await
            .expect("Table should be visible");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_transaction_rollback_on_drop() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");

        {
            let mut tx = pool.begin().await.expect("Failed to begin");
            sqlx::query("INSERT INTO items (name) VALUES ('lost')")
                .execute(&mut *tx)
                .await
                .expect("Failed to insert");
        }

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(pool.pool())
            .await
            .expect("Failed to count");
        assert_eq!(count, 0);
    }

    #[tokio::test]
    async fn test_committed_write_is_visible() {
        let pool = create_test_pool().await.expect("Failed to create pool");
        pool.execute("CREATE TABLE items (id INTEGER PRIMARY KEY, name TEXT)")
            .await
            .expect("Failed to create table");

        let mut tx = pool.begin().await.expect("Failed to begin");
        sqlx::query("INSERT INTO items (name) VALUES ('kept')")
            .execute(&mut *tx)
            .await
            .expect("Failed to insert");
        tx.commit().await.expect("Failed to commit");

        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM items")
            .fetch_one(pool.pool())
            .await
            .expect("Failed to count");
        assert_eq!(count, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_on_file_database() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let config = DatabaseConfig {
            url: temp_dir.path().join("news.db").to_string_lossy().to_string(),
            max_connections: 8,
        };
        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.execute("CREATE TABLE counter (id INTEGER PRIMARY KEY, value INTEGER NOT NULL)")
            .await
            .expect("Failed to create table");
        pool.execute("INSERT INTO counter (id, value) VALUES (1, 0)")
            .await
            .expect("Failed to seed counter");

        // Read-modify-write: loses updates unless writers are serialized.
        let mut handles = Vec::new();
        for _ in 0..16 {
            let pool = pool.clone();
            handles.push(tokio::spawn(async move {
                let mut tx = pool.begin().await?;
                let value: i64 = sqlx::query_scalar("SELECT value FROM counter WHERE id = 1")
                    .fetch_one(&mut *tx)
                    .await?;
                sqlx::query("UPDATE counter SET value = ? WHERE id = 1")
                    .bind(value + 1)
                    .execute(&mut *tx)
                    .await?;
                tx.commit().await?;
                anyhow::Ok(())
            }));
        }
        for handle in handles {
            handle
                .await
                .expect("Writer task panicked")
                .expect("Writer failed");
        }

        let value: i64 = sqlx::query_scalar("SELECT value FROM counter WHERE id = 1")
            .fetch_one(pool.pool())
            .await
            .expect("Failed to read counter");
        assert_eq!(value, 16);
    }

    #[tokio::test]
    async fn test_sqlite_nested_directory_creation() {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("nested").join("dir").join("news.db");

        let config = DatabaseConfig {
            url: db_path.to_string_lossy().to_string(),
            max_connections: 2,
        };

        let pool = create_pool(&config).await.expect("Failed to create pool");
        pool.ping().await.expect("Ping should succeed");

        assert!(db_path.exists());
    }

    #[test]
    fn test_is_memory_url() {
        assert!(is_memory_url(":memory:"));
        assert!(is_memory_url("sqlite::memory:"));
        assert!(!is_memory_url("data/newsdesk.db"));
        assert!(!is_memory_url("sqlite:data/newsdesk.db"));
    }
}
