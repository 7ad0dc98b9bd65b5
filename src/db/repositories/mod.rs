//! Database repositories
//!
//! Repository pattern implementations for database access.
//! Each repository handles CRUD operations for a specific entity and runs on
//! whatever connection or transaction the caller passes in.

pub mod author;
pub mod comment;
pub mod news;
pub mod tag;

pub use author::{AuthorRepository, SqlxAuthorRepository};
pub use comment::{CommentRepository, SqlxCommentRepository};
pub use news::{NewsRepository, SqlxNewsRepository};
pub use tag::{SqlxTagRepository, TagRepository};
