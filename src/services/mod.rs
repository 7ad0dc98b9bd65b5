//! Services layer - Business logic
//!
//! One service per aggregate. Payloads arrive already validated (see
//! `validation`). Services are responsible for:
//! - Running each mutating operation in one transaction
//! - Translating missing rows and constraint violations into `ServiceError`

pub mod author;
pub mod comment;
pub mod error;
pub mod news;
pub mod tag;
pub mod validation;

pub use author::AuthorService;
pub use comment::CommentService;
pub use error::{FieldError, ServiceError, ServiceErrorCode};
pub use news::NewsService;
pub use tag::TagService;
