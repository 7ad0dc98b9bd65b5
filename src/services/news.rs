//! News service
//!
//! Implements business logic for news management:
//! - Paged, filtered and sorted listing with author, tags and comments resolved
//! - Create and merge-update with authors and tags referenced by name
//! - Delete, leaving the author and tags in place
//!
//! Author and tag names that do not exist yet are created on the fly. The
//! lookup, the implicit creates and the news write all share one transaction,
//! so a failure part way through leaves nothing behind. When a concurrent
//! writer wins the race for a new name, the unique constraint on the name
//! fires and the row that writer created is reused.

use crate::db::query::CompiledQuery;
use crate::db::repositories::{
    AuthorRepository, CommentRepository, NewsRepository, TagRepository,
};
use crate::db::{is_unique_violation, Database};
use crate::models::{
    non_blank, Author, CreateNewsInput, News, NewsDetails, Tag, UpdateNewsInput,
};
use crate::search::{NewsSearchFilterMapper, Page, SearchFilterMapper, SearchRequest};
use anyhow::anyhow;
use sqlx::SqliteConnection;
use std::sync::Arc;

use super::error::{FieldError, ServiceError, ServiceErrorCode};

/// News service
///
/// Owns the repositories of every entity a news item touches, since a
/// single news write may create authors and tags.
pub struct NewsService {
    db: Database,
    news_repo: Arc<dyn NewsRepository>,
    author_repo: Arc<dyn AuthorRepository>,
    tag_repo: Arc<dyn TagRepository>,
    comment_repo: Arc<dyn CommentRepository>,
    mapper: NewsSearchFilterMapper,
}

impl NewsService {
    pub fn new(
        db: Database,
        news_repo: Arc<dyn NewsRepository>,
        author_repo: Arc<dyn AuthorRepository>,
        tag_repo: Arc<dyn TagRepository>,
        comment_repo: Arc<dyn CommentRepository>,
    ) -> Self {
        Self {
            db,
            news_repo,
            author_repo,
            tag_repo,
            comment_repo,
            mapper: NewsSearchFilterMapper,
        }
    }

    /// One page of news with relations resolved
    ///
    /// Sorted by title ascending, then newest first, unless the request
    /// names its own sort keys.
    pub async fn read_all(
        &self,
        request: &SearchRequest,
    ) -> Result<Page<NewsDetails>, ServiceError> {
        let criteria = self.mapper.map(request)?;
        let query = CompiledQuery::compile::<News>(&criteria)?;

        let mut conn = self.db.acquire().await?;
        let page = self.news_repo.search(&mut conn, &query).await?;

        let mut details = Vec::with_capacity(page.entities.len());
        for news in page.entities {
            details.push(self.load_details(&mut conn, news).await?);
        }

        Ok(Page::new(details, page.current_page, page.page_count))
    }

    pub async fn read_by_id(&self, id: i64) -> Result<NewsDetails, ServiceError> {
        let mut conn = self.db.acquire().await?;
        let news = self
            .news_repo
            .read_by_id(&mut conn, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::NewsIdDoesNotExist, id))?;

        self.load_details(&mut conn, news).await
    }

    /// Create a news item
    ///
    /// The author and every tag are looked up by name and created when
    /// missing. Blank tag names are skipped and repeated names attach the
    /// tag once.
    ///
    /// # Errors
    /// - `ValidationFailed` if the author name is blank
    /// - `Conflict` if the store rejects the news row
    pub async fn create(&self, input: CreateNewsInput) -> Result<NewsDetails, ServiceError> {
        let author_name = non_blank(Some(&input.author)).ok_or_else(|| {
            ServiceError::ValidationFailed(vec![FieldError {
                field: "author".to_string(),
                message: "must not be blank".to_string(),
            }])
        })?;

        let mut tx = self.db.begin().await?;

        let author = self.find_or_create_author(&mut tx, author_name).await?;
        let tags = self.find_or_create_tags(&mut tx, &input.tags).await?;

        let news = News::new(
            input.title.trim().to_string(),
            input.content.trim().to_string(),
            author.id,
        );
        let created = self
            .news_repo
            .create(&mut *tx, &news)
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::NewsConflict))?;

        let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
        self.news_repo
            .set_tags(&mut *tx, created.id, &tag_ids)
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::NewsConflict))?;

        tx.commit().await?;

        tracing::info!("Created news {} by {}", created.id, author.name);
        Ok(NewsDetails {
            news: created,
            author,
            tags,
            comments: Vec::new(),
        })
    }

    /// Merge-update a news item
    ///
    /// Non-blank title and content overwrite the stored values. A non-blank
    /// author name is resolved (and created if missing) and becomes the new
    /// author. When `tags` is present the tag set is replaced by exactly
    /// those tags; tags dropped from the set stay in the store.
    ///
    /// # Errors
    /// - `NotFound` if the news item does not exist; nothing is created then
    pub async fn update(&self, id: i64, input: UpdateNewsInput) -> Result<NewsDetails, ServiceError> {
        let mut tx = self.db.begin().await?;

        let mut news = self
            .news_repo
            .read_by_id(&mut *tx, id)
            .await?
            .ok_or_else(|| ServiceError::not_found(ServiceErrorCode::NewsIdDoesNotExist, id))?;

        if let Some(title) = non_blank(input.title.as_deref()) {
            news.title = title.to_string();
        }
        if let Some(content) = non_blank(input.content.as_deref()) {
            news.content = content.to_string();
        }

        if let Some(name) = non_blank(input.author.as_deref()) {
            self.find_or_create_author(&mut tx, name).await?;
            let author = self
                .author_repo
                .read_by_name(&mut *tx, name)
                .await?
                .ok_or_else(|| {
                    ServiceError::not_found_with(
                        ServiceErrorCode::ResourceNotFound,
                        format!("Author with name {} not found.", name),
                    )
                })?;
            news.author_id = author.id;
        }

        let updated = self
            .news_repo
            .update(&mut *tx, &news)
            .await
            .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::NewsConflict))?;

        if let Some(names) = &input.tags {
            let tags = self.find_or_create_tags(&mut tx, names).await?;
            let tag_ids: Vec<i64> = tags.iter().map(|t| t.id).collect();
            self.news_repo
                .set_tags(&mut *tx, updated.id, &tag_ids)
                .await
                .map_err(|e| ServiceError::from_write(e, ServiceErrorCode::NewsConflict))?;
        }

        let details = self.load_details(&mut tx, updated).await?;
        tx.commit().await?;

        Ok(details)
    }

    /// Delete a news item with its comments and tag links
    pub async fn delete_by_id(&self, id: i64) -> Result<(), ServiceError> {
        let mut tx = self.db.begin().await?;
        if !self.news_repo.exists_by_id(&mut *tx, id).await? {
            return Err(ServiceError::not_found(ServiceErrorCode::NewsIdDoesNotExist, id));
        }

        self.news_repo.delete_by_id(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!("Deleted news {}", id);
        Ok(())
    }

    /// Resolve an author by name, creating it when missing
    async fn find_or_create_author(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Author, ServiceError> {
        if let Some(author) = self.author_repo.read_by_name(conn, name).await? {
            return Ok(author);
        }

        match self.author_repo.create(conn, &Author::new(name.to_string())).await {
            Ok(author) => {
                tracing::debug!("Auto-created author {} ({})", author.id, author.name);
                Ok(author)
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!("Author {} was created concurrently, reusing it", name);
                self.author_repo
                    .read_by_name(conn, name)
                    .await?
                    .ok_or_else(|| ServiceError::from_write(e, ServiceErrorCode::AuthorConflict))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Resolve tags by name in request order, creating missing ones
    ///
    /// Blank names are skipped; a name given twice yields the tag once.
    async fn find_or_create_tags(
        &self,
        conn: &mut SqliteConnection,
        names: &[String],
    ) -> Result<Vec<Tag>, ServiceError> {
        let mut tags: Vec<Tag> = Vec::with_capacity(names.len());

        for name in names {
            let Some(name) = non_blank(Some(name.as_str())) else {
                continue;
            };
            let tag = self.find_or_create_tag(conn, name).await?;
            if !tags.iter().any(|t| t.id == tag.id) {
                tags.push(tag);
            }
        }

        Ok(tags)
    }

    async fn find_or_create_tag(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<Tag, ServiceError> {
        if let Some(tag) = self.tag_repo.read_by_name(conn, name).await? {
            return Ok(tag);
        }

        match self.tag_repo.create(conn, &Tag::new(name.to_string())).await {
            Ok(tag) => {
                tracing::debug!("Auto-created tag {} ({})", tag.id, tag.name);
                Ok(tag)
            }
            Err(e) if is_unique_violation(&e) => {
                tracing::warn!("Tag {} was created concurrently, reusing it", name);
                self.tag_repo
                    .read_by_name(conn, name)
                    .await?
                    .ok_or_else(|| ServiceError::from_write(e, ServiceErrorCode::TagConflict))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn load_details(
        &self,
        conn: &mut SqliteConnection,
        news: News,
    ) -> Result<NewsDetails, ServiceError> {
        let author = self
            .author_repo
            .read_by_id(&mut *conn, news.author_id)
            .await?
            .ok_or_else(|| anyhow!("News {} references missing author {}", news.id, news.author_id))?;
        let tags = self.tag_repo.read_by_news_id(&mut *conn, news.id).await?;
        let comments = self.comment_repo.read_by_news_id(&mut *conn, news.id).await?;

        Ok(NewsDetails {
            news,
            author,
            tags,
            comments,
        })
    }
}
