//! Comment service
//!
//! Comments always hang off an existing news item. Creating one for an
//! unknown news ID fails before anything is written.

use crate::db::query::CompiledQuery;
use crate::db::repositories::{CommentRepository, NewsRepository};
use crate::db::Database;
use crate::models::{non_blank, Comment, CreateCommentInput, UpdateCommentInput};
use crate::search::{CommentSearchFilterMapper, Page, SearchFilterMapper, SearchRequest};
use std::sync::Arc;

use super::error::{ServiceError, ServiceErrorCode};

/// Comment service
pub struct CommentService {
    db: Database,
    repo: Arc<dyn CommentRepository>,
    news_repo: Arc<dyn NewsRepository>,
    mapper: CommentSearchFilterMapper,
}

impl CommentService {
    pub fn new(
        db: Database,
        repo: Arc<dyn CommentRepository>,
        news_repo: Arc<dyn NewsRepository>,
    ) -> Self {
        Self {
            db,
            repo,
            news_repo,
            mapper: CommentSearchFilterMapper,
        }
    }

    /// One page of comments, newest first by default
    pub async fn read_all(&self, request: &SearchRequest) -> Result<Page<Comment>, ServiceError> {
        let criteria = self.mapper.map(request)?;
        let query = CompiledQuery::compile::<Comment>(&criteria)?;

        let mut conn = self.db.acquire().await?;
        Ok(self.repo.search(&mut conn, &query).await?)
    }

    pub async fn read_by_id(&self, id: i64) -> Result<Comment, ServiceError> {
        let mut conn = self.db.acquire().await?;
        self.repo
            .read_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::CommentIdDoesNotExist, id))
    }

    /// Comments of a news item, newest first
    pub async fn read_by_news_id(&self, news_id: i64) -> Result<Vec<Comment>, ServiceError> {
        let mut conn = self.db.acquire().await?;
        if !self.news_repo.exists_by_id(&mut conn, news_id).await? {
            return Err(ServiceError::not_found(
                ServiceErrorCode::NewsIdDoesNotExist,
                news_id,
            ));
        }

        Ok(self.repo.read_by_news_id(&mut conn, news_id).await?)
    }

    pub async fn create(&self, input: CreateCommentInput) -> Result<Comment, ServiceError> {
        let mut tx = self.db.begin().await?;
        if !self.news_repo.exists_by_id(&mut *tx, input.news_id).await? {
            return Err(ServiceError::not_found(
                ServiceErrorCode::NewsIdDoesNotExist,
                input.news_id,
            ));
        }

        let comment = Comment::new(input.content.trim().to_string(), input.news_id);
        let created = self
            .repo
            .create(&mut *tx, &comment)
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::CommentConflict))?;
        tx.commit().await?;

        tracing::info!("Created comment {} on news {}", created.id, created.news_id);
        Ok(created)
    }

    /// Replace the content of a comment; blank content leaves it unchanged
    pub async fn update(&self, id: i64, input: UpdateCommentInput) -> Result<Comment, ServiceError> {
        let mut tx = self.db.begin().await?;
        let mut comment = self
            .repo
            .read_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::CommentIdDoesNotExist, id))?;

        if let Some(content) = non_blank(input.content.as_deref()) {
            comment.content = content.to_string();
        }

        let updated = self.repo.update(&mut *tx, &comment).await?;
        tx.commit().await?;

        Ok(updated)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.db.begin().await?;
        if !self.repo.exists_by_id(&mut *tx, id).await? {
            return Err(ServiceError::not_found(ServiceErrorCode::CommentIdDoesNotExist, id));
        }

        self.repo.delete_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Deleted comment {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::{SqlxCommentRepository, SqlxNewsRepository};
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_service() -> (Database, CommentService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        pool.execute("INSERT INTO authors (id, name, created_at, updated_at) VALUES (1, 'Gosling', '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')")
            .await
            .unwrap();
        pool.execute("INSERT INTO news (id, title, content, author_id, created_at, updated_at) VALUES (1, 'Java', 'Language', 1, '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')")
            .await
            .unwrap();

        let service = CommentService::new(
            pool.clone(),
            SqlxCommentRepository::boxed(),
            SqlxNewsRepository::boxed(),
        );
        (pool, service)
    }

    fn create_input(content: &str, news_id: i64) -> CreateCommentInput {
        CreateCommentInput {
            content: content.to_string(),
            news_id,
        }
    }

    #[tokio::test]
    async fn test_create_comment() {
        let (_pool, service) = setup_test_service().await;

        let created = service.create(create_input("Nice one", 1)).await.unwrap();
        assert_eq!(created.news_id, 1);
        assert_eq!(service.read_by_id(created.id).await.unwrap(), created);
    }

    #[tokio::test]
    async fn test_create_for_missing_news_persists_nothing() {
        let (_pool, service) = setup_test_service().await;

        let err = service.create(create_input("Nice one", 99)).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::NewsIdDoesNotExist);
        assert_eq!(err.to_string(), "News with id 99 does not exist.");

        let page = service
            .read_all(&SearchRequest {
                page: 1,
                page_size: 5,
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(page.entities.is_empty());
        assert_eq!(page.page_count, 0);
    }

    #[tokio::test]
    async fn test_update_merges_content() {
        let (_pool, service) = setup_test_service().await;
        let created = service.create(create_input("Typo heer", 1)).await.unwrap();

        let kept = service
            .update(created.id, UpdateCommentInput { content: Some(" ".into()) })
            .await
            .unwrap();
        assert_eq!(kept.content, "Typo heer");

        let fixed = service
            .update(
                created.id,
                UpdateCommentInput {
                    content: Some("Typo here".into()),
                },
            )
            .await
            .unwrap();
        assert_eq!(fixed.content, "Typo here");
        assert_eq!(fixed.news_id, 1);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_comment() {
        let (_pool, service) = setup_test_service().await;

        let err = service
            .update(8, UpdateCommentInput::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::CommentIdDoesNotExist);

        let err = service.delete_by_id(8).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::CommentIdDoesNotExist);
    }

    #[tokio::test]
    async fn test_read_by_news_id() {
        let (_pool, service) = setup_test_service().await;
        service.create(create_input("First!", 1)).await.unwrap();
        let latest = service.create(create_input("Second", 1)).await.unwrap();

        let comments = service.read_by_news_id(1).await.unwrap();
        assert_eq!(comments.len(), 2);
        assert_eq!(comments[0].id, latest.id);

        let err = service.read_by_news_id(2).await.unwrap_err();
        assert_eq!(err.code(), ServiceErrorCode::NewsIdDoesNotExist);
    }

    #[tokio::test]
    async fn test_read_all_filtered_by_news() {
        let (pool, service) = setup_test_service().await;
        pool.execute("INSERT INTO news (id, title, content, author_id, created_at, updated_at) VALUES (2, 'Kotlin', 'Language', 1, '2024-01-01T00:00:00+00:00', '2024-01-01T00:00:00+00:00')")
            .await
            .unwrap();
        service.create(create_input("About Java", 1)).await.unwrap();
        service.create(create_input("About Kotlin", 2)).await.unwrap();

        let page = service
            .read_all(&SearchRequest {
                page: 1,
                page_size: 5,
                sort_by_and_order: vec![],
                search_criteria: vec!["newsId:EQ:2".to_string()],
            })
            .await
            .unwrap();
        assert_eq!(page.entities.len(), 1);
        assert_eq!(page.entities[0].content, "About Kotlin");
    }
}
