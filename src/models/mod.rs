//! Data models
//!
//! This module contains the entities of the newsdesk service and the input
//! types accepted by the services:
//! - News, with its resolved `NewsDetails` view
//! - Author
//! - Tag
//! - Comment

mod author;
mod comment;
mod news;
mod tag;

pub use author::{Author, CreateAuthorInput, UpdateAuthorInput};
pub use comment::{Comment, CreateCommentInput, UpdateCommentInput};
pub use news::{CreateNewsInput, News, NewsDetails, UpdateNewsInput};
pub use tag::{CreateTagInput, Tag, UpdateTagInput};

/// Return the trimmed value when it holds something other than whitespace
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank() {
        assert_eq!(non_blank(Some("  Java ")), Some("Java"));
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some("")), None);
        assert_eq!(non_blank(None), None);
    }

    #[test]
    fn test_update_news_input_distinguishes_missing_tags() {
        let input: UpdateNewsInput = serde_json::from_str(r#"{"content":"Updated"}"#).unwrap();
        assert!(input.tags.is_none());
        assert!(input.title.is_none());

        let input: UpdateNewsInput = serde_json::from_str(r#"{"tags":[]}"#).unwrap();
        assert_eq!(input.tags, Some(vec![]));
    }

    #[test]
    fn test_create_comment_input_uses_camel_case() {
        let input: CreateCommentInput =
            serde_json::from_str(r#"{"content":"Great read","newsId":7}"#).unwrap();
        assert_eq!(input.news_id, 7);
    }
}
