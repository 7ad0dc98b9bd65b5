//! Tag service
//!
//! Implements business logic for tag management:
//! - Paged, filtered and sorted listing
//! - CRUD with not-found and conflict translation
//! - Tags of a news item
//!
//! Tags created implicitly by news requests go through `NewsService`; this
//! service covers tags addressed directly.

use crate::db::query::CompiledQuery;
use crate::db::repositories::{NewsRepository, TagRepository};
use crate::db::Database;
use crate::models::{non_blank, CreateTagInput, Tag, UpdateTagInput};
use crate::search::{Page, SearchFilterMapper, SearchRequest, TagSearchFilterMapper};
use std::sync::Arc;

use super::error::{ServiceError, ServiceErrorCode};

/// Tag service for managing news tags
pub struct TagService {
    db: Database,
    repo: Arc<dyn TagRepository>,
    news_repo: Arc<dyn NewsRepository>,
    mapper: TagSearchFilterMapper,
}

impl TagService {
    /// Create a new tag service
    ///
    /// # Arguments
    /// * `db` - Database handle used to open connections and transactions
    /// * `repo` - Tag repository
    /// * `news_repo` - News repository, for existence checks on nested reads
    pub fn new(
        db: Database,
        repo: Arc<dyn TagRepository>,
        news_repo: Arc<dyn NewsRepository>,
    ) -> Self {
        Self {
            db,
            repo,
            news_repo,
            mapper: TagSearchFilterMapper,
        }
    }

    /// One page of tags; sorted by name unless the request says otherwise
    pub async fn read_all(&self, request: &SearchRequest) -> Result<Page<Tag>, ServiceError> {
        let criteria = self.mapper.map(request)?;
        let query = CompiledQuery::compile::<Tag>(&criteria)?;

        let mut conn = self.db.acquire().await?;
        Ok(self.repo.search(&mut conn, &query).await?)
    }

    /// Get tag by ID
    ///
    /// # Errors
    /// - `NotFound` if no tag has this ID
    pub async fn read_by_id(&self, id: i64) -> Result<Tag, ServiceError> {
        let mut conn = self.db.acquire().await?;
        self.repo
            .read_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::TagIdDoesNotExist, id))
    }

    /// Tags attached to a news item, in attachment order
    ///
    /// # Errors
    /// - `NotFound` if the news item does not exist
    pub async fn read_by_news_id(&self, news_id: i64) -> Result<Vec<Tag>, ServiceError> {
        let mut conn = self.db.acquire().await?;
        if !self.news_repo.exists_by_id(&mut conn, news_id).await? {
            return Err(ServiceError::not_found(
                ServiceErrorCode::NewsIdDoesNotExist,
                news_id,
            ));
        }

        Ok(self.repo.read_by_news_id(&mut conn, news_id).await?)
    }

    /// Create a tag
    ///
    /// # Errors
    /// - `Conflict` if a tag with that name exists
    pub async fn create(&self, input: CreateTagInput) -> Result<Tag, ServiceError> {
        let mut tx = self.db.begin().await?;
        let created = self
            .repo
            .create(&mut *tx, &Tag::new(input.name.trim().to_string()))
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::TagConflict))?;
        tx.commit().await?;

        tracing::info!("Created tag {} ({})", created.id, created.name);
        Ok(created)
    }

    /// Rename a tag; a blank or missing name leaves it unchanged
    pub async fn update(&self, id: i64, input: UpdateTagInput) -> Result<Tag, ServiceError> {
        let mut tx = self.db.begin().await?;
        let mut tag = self
            .repo
            .read_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::TagIdDoesNotExist, id))?;

        let Some(name) = non_blank(input.name.as_deref()) else {
            return Ok(tag);
        };
        tag.name = name.to_string();

        let updated = self
            .repo
            .update(&mut *tx, &tag)
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::TagConflict))?;
        tx.commit().await?;

        Ok(updated)
    }

    /// Delete a tag, detaching it from every news item
    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.db.begin().await?;
        if !self.repo.exists_by_id(&mut *tx, id).await? {
            return Err(ServiceError::not_found(ServiceErrorCode::TagIdDoesNotExist, id));
        }

        self.repo.delete_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Deleted tag {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxNewsRepository, SqlxTagRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> (Database, TagService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let service = TagService::new(
            pool.clone(),
            SqlxTagRepository::boxed(),
            SqlxNewsRepository::boxed(),
        );
        (pool, service)
    }

    fn create_input(name: &str) -> CreateTagInput {
        CreateTagInput {
            name: name.to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_tag() {
        let (_pool, service) = setup_test_service().await;

        let tag = service.create(create_input("Technology")).await.unwrap();
        assert!(tag.id > 0);
        assert_eq!(service.read_by_id(tag.id).await.unwrap(), tag);
    }

    #[tokio::test]
    async fn test_create_duplicate_is_conflict() {
        let (_pool, service) = setup_test_service().await;
        service.create(create_input("Technology")).await.unwrap();

        let err = service.create(create_input(" Technology")).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::TagConflict);
    }

    #[tokio::test]
    async fn test_update_tag() {
        let (_pool, service) = setup_test_service().await;
        let tag = service.create(create_input("Tech")).await.unwrap();

        let unchanged = service
            .update(tag.id, UpdateTagInput { name: None })
            .await
            .unwrap();
        assert_eq!(unchanged.name, "Tech");

        let renamed = service
            .update(
                tag.id,
                UpdateTagInput {
                    name: Some("Technology".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Technology");
    }

    #[tokio::test]
    async fn test_rename_onto_existing_name_is_conflict() {
        let (_pool, service) = setup_test_service().await;
        service.create(create_input("Rust")).await.unwrap();
        let other = service.create(create_input("Java")).await.unwrap();

        let err = service
            .update(
                other.id,
                UpdateTagInput {
                    name: Some("Rust".to_string()),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::TagConflict);
    }

    #[tokio::test]
    async fn test_delete_tag() {
        let (_pool, service) = setup_test_service().await;
        let tag = service.create(create_input("Technology")).await.unwrap();

        service.delete_by_id(tag.id).await.unwrap();
        let err = service.read_by_id(tag.id).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::TagIdDoesNotExist);
        assert!(service.delete_by_id(tag.id).await.is_err());
    }

    #[tokio::test]
    async fn test_read_by_news_id_requires_news() {
        let (_pool, service) = setup_test_service().await;

        let err = service.read_by_news_id(5).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::NewsIdDoesNotExist);
    }

    #[tokio::test]
    async fn test_read_all_with_filter() {
        let (_pool, service) = setup_test_service().await;
        for name in ["Rust", "Ruby", "Java", "Kotlin"] {
            service.create(create_input(name)).await.unwrap();
        }

        let page = service
            .read_all(&SearchRequest {
                page: 1,
                page_size: 5,
                sort_by_and_order: vec![],
                search_criteria: vec!["name:like:Ru".to_string(), "broken".to_string()],
            })
            .await
            .unwrap();

        let names: Vec<&str> = page.entities.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Ruby", "Rust"]);
        assert_eq!(page.page_count, 1);
    }

    #[tokio::test]
    async fn test_read_all_beyond_last_page_is_empty() {
        let (_pool, service) = setup_test_service().await;
        service.create(create_input("Rust")).await.unwrap();

        let page = service
            .read_all(&SearchRequest {
                page: 4,
                page_size: 5,
                ..Default::default()
            })
            .await
            .unwrap();

        assert!(page.entities.is_empty());
        assert_eq!(page.page_count, 1);
        assert_eq!(page.current_page, 4);
    }
}
