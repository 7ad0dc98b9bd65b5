//! Author service
//!
//! Business logic for authors:
//! - Paged, filtered and sorted listing
//! - CRUD with not-found and conflict translation
//! - Lookup of the author of a news item
//!
//! Every mutating operation runs in a single transaction.

use crate::db::query::CompiledQuery;
use crate::db::repositories::AuthorRepository;
use crate::db::Database;
use crate::models::{non_blank, Author, CreateAuthorInput, UpdateAuthorInput};
use crate::search::{AuthorSearchFilterMapper, Page, SearchFilterMapper, SearchRequest};
use std::sync::Arc;

use super::error::{ServiceError, ServiceErrorCode};

/// Author service
pub struct AuthorService {
    db: Database,
    repo: Arc<dyn AuthorRepository>,
    mapper: AuthorSearchFilterMapper,
}

impl AuthorService {
    pub fn new(db: Database, repo: Arc<dyn AuthorRepository>) -> Self {
        Self {
            db,
            repo,
            mapper: AuthorSearchFilterMapper,
        }
    }

    /// One page of authors; sorted by name unless the request says otherwise
    pub async fn read_all(&self, request: &SearchRequest) -> Result<Page<Author>, ServiceError> {
        let criteria = self.mapper.map(request)?;
        let query = CompiledQuery::compile::<Author>(&criteria)?;

        let mut conn = self.db.acquire().await?;
        Ok(self.repo.search(&mut conn, &query).await?)
    }

    pub async fn read_by_id(&self, id: i64) -> Result<Author, ServiceError> {
        let mut conn = self.db.acquire().await?;
        self.repo
            .read_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::AuthorIdDoesNotExist, id))
    }

    /// Author of a news item
    ///
    /// # Errors
    /// - `NotFound` (`000004`) if the news item does not exist
    pub async fn read_by_news_id(&self, news_id: i64) -> Result<Author, ServiceError> {
        let mut conn = self.db.acquire().await?;
        self.repo
            .read_by_news_id(&mut conn, news_id)
            .await?
            .ok_or_else(|| {
                ServiceError::not_found(ServiceErrorCode::AuthorDoesNotExistForNewsId, news_id)
            })
    }

    /// Create an author
    ///
    /// # Errors
    /// - `Conflict` if an author with that name exists
    pub async fn create(&self, input: CreateAuthorInput) -> Result<Author, ServiceError> {
        let mut tx = self.db.begin().await?;
        let created = self
            .repo
            .create(&mut *tx, &Author::new(input.name.trim().to_string()))
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::AuthorConflict))?;
        tx.commit().await?;

        tracing::info!("Created author {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Rename an author; a blank or missing name only refreshes `updated_at`
    pub async fn update(&self, id: i64, input: UpdateAuthorInput) -> Result<Author, ServiceError> {
        let mut tx = self.db.begin().await?;
        let mut author = self
            .repo
            .read_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::AuthorIdDoesNotExist, id))?;

        if let Some(name) = non_blank(input.name.as_deref()) {
            author.name = name.to_string();
        }

        let updated = self
            .repo
            .update(&mut *tx, &author)
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::AuthorConflict))?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Delete an author
    ///
    /// # Errors
    /// - `NotFound` if the author does not exist
    /// - `Conflict` while news items still reference the author
    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.db.begin().await?;
        if !self.repo.exists_by_id(&mut *tx, id).await? {
            return Err(ServiceError::not_found(ServiceErrorCode::AuthorIdDoesNotExist, id));
        }

        match self.repo.delete_by_id(&mut *tx, id).await {
            Ok(_) => {}
            Err(e) if crate::db::is_foreign_key_violation(&e) => {
                return Err(ServiceError::conflict(
                    ServiceErrorCode::AuthorConflict,
                    format!("Author with id {} is still referenced by news.", id),
                ));
            }
            Err(e) => return Err(e.into()),
        }
        tx.commit().await?;

        tracing::info!("Deleted author {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxAuthorRepository;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> (Database, AuthorService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = AuthorService::new(pool.clone(), SqlxAuthorRepository::boxed());
        (pool, service)
    }

    fn create_input(name: &str) -> CreateAuthorInput {
        CreateAuthorInput {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_read_author() {
        let (_pool, service) = setup_test_service().await;

        let created = service.create(create_input("  Gosling ")).await.unwrap();
        assert_eq!(created.name, "Gosling");

        let found = service.read_by_id(created.id).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let (_pool, service) = setup_test_service().await;
        service.create(create_input("Gosling")).await.unwrap();

        let err = service.create(create_input("Gosling")).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::AuthorConflict);
        assert!(matches!(err, ServiceError::Conflict { .. }));
    }

    #[tokio::test]
    async fn test_read_missing_author() {
        let (_pool, service) = setup_test_service().await;

        let err = service.read_by_id(7).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::AuthorIdDoesNotExist);
        assert_eq!(err.to_string(), "Author with id 7 does not exist.");
    }

    #[tokio::test]
    async fn test_update_with_blank_name_keeps_name() {
        let (_pool, service) = setup_test_service().await;
        let created = service.create(create_input("Gosling")).await.unwrap();

        let updated = service
            .update(
                created.id,
                UpdateAuthorInput {
                    name: Some("   ".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "Gosling");

        let renamed = service
            .update(
                created.id,
                UpdateAuthorInput {
                    name: Some("James".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "James");
        assert_eq!(renamed.created_at, created.created_at);
    }

    #[tokio::test]
    async fn test_update_missing_author() {
        let (_pool, service) = setup_test_service().await;

        let err = service
            .update(3, UpdateAuthorInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::AuthorIdDoesNotExist);
    }

    #[tokio::test]
    async fn test_delete_author() {
        let (_pool, service) = setup_test_service().await;
        let created = service.create(create_input("Gosling")).await.unwrap();

        service.delete_by_id(created.id).await.unwrap();
        let err = service.delete_by_id(created.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_delete_author_with_news_is_conflict() {
        let (pool, service) = setup_test_service().await;
        let created = service.create(create_input("Gosling")).await.unwrap();
        pool.execute(&format!(
            "INSERT INTO news (title, content, author_id, created_at, updated_at) \
             VALUES ('Java', 'Language', {}, '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
            created.id
        ))
        .await
        .unwrap();

        let err = service.delete_by_id(created.id).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::AuthorConflict);
        assert!(service.read_by_id(created.id).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_by_news_id() {
        let (pool, service) = setup_test_service().await;
        let created = service.create(create_input("Gosling")).await.unwrap();
        pool.execute(&format!(
            "INSERT INTO news (id, title, content, author_id, created_at, updated_at) \
             VALUES (10, 'Java', 'Language', {}, '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')",
            created.id
        ))
        .await
        .unwrap();

        assert_eq!(service.read_by_news_id(10).await.unwrap().name, "Gosling");

        let err = service.read_by_news_id(11).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::AuthorDoesNotExistForNewsId);
        assert_eq!(err.to_string(), "Author not found for news with id 11.");
    }

    #[tokio::test]
    async fn test_read_all_defaults_to_name_order() {
        let (_pool, service) = setup_test_service().await;
        for name in ["Ritchie", "Gosling", "Thompson", "Kernighan"] {
            service.create(create_input(name)).await.unwrap();
        }

        let page = service
            .read_all(&SearchRequest {
                page: 1,
                page_size: 3,
                ..Default::default()
            })
            .await
            .unwrap();

        let names: Vec<&str> = page.entities.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Gosling", "Kernighan", "Ritchie"]);
        assert_eq!(page.page_count, 2);
        assert_eq!(page.current_page, 1);
    }

    #[tokio::test]
    async fn test_read_all_rejects_bad_sort_order() {
        let (_pool, service) = setup_test_service().await;

        let err = service
            .read_all(&SearchRequest {
                page: 1,
                page_size: 5,
                sort_by_and_order: vec!["name:sideways".to_string()],
                search_criteria: vec![],
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidArgument(_)));
    }
}
