//! Field validation for request payloads
//!
//! Handlers validate payloads before passing them to a service. Lengths are
//! counted in characters of the trimmed value.

use super::error::{FieldError, ServiceError};
use crate::models::{
    CreateAuthorInput, CreateCommentInput, CreateNewsInput, CreateTagInput, UpdateAuthorInput,
    UpdateCommentInput, UpdateNewsInput, UpdateTagInput,
};

pub const AUTHOR_NAME_LEN: (usize, usize) = (3, 15);
pub const TAG_NAME_LEN: (usize, usize) = (3, 15);
pub const NEWS_TITLE_LEN: (usize, usize) = (5, 30);
pub const NEWS_CONTENT_LEN: (usize, usize) = (5, 255);
pub const COMMENT_CONTENT_LEN: (usize, usize) = (5, 255);

/// Collects field errors and fails once with all of them
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<FieldError>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Value must be present and within `bounds` characters
    pub fn required(&mut self, field: &str, value: &str, bounds: (usize, usize)) -> &mut Self {
        if value.trim().is_empty() {
            self.push(field, "must not be blank".to_string());
        } else {
            self.length(field, value, bounds);
        }
        self
    }

    /// Blank or missing values pass; anything else must be within `bounds`
    pub fn optional(&mut self, field: &str, value: Option<&str>, bounds: (usize, usize)) -> &mut Self {
        if let Some(value) = value {
            if !value.trim().is_empty() {
                self.length(field, value, bounds);
            }
        }
        self
    }

    /// Every non-blank entry must be within `bounds`
    pub fn each<'a>(
        &mut self,
        field: &str,
        values: impl IntoIterator<Item = &'a String>,
        bounds: (usize, usize),
    ) -> &mut Self {
        for (i, value) in values.into_iter().enumerate() {
            if !value.trim().is_empty() {
                self.length(&format!("{}[{}]", field, i), value, bounds);
            }
        }
        self
    }

    fn length(&mut self, field: &str, value: &str, (min, max): (usize, usize)) {
        let len = value.trim().chars().count();
        if len < min || len > max {
            self.push(field, format!("must be between {} and {} characters", min, max));
        }
    }

    fn push(&mut self, field: &str, message: String) {
        self.errors.push(FieldError {
            field: field.to_string(),
            message,
        });
    }

    pub fn finish(&mut self) -> Result<(), ServiceError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ServiceError::ValidationFailed(std::mem::take(&mut self.errors)))
        }
    }
}

/// Payload validation
pub trait Validate {
    /// # Errors
    /// `ValidationFailed` listing every rejected field
    fn validate(&self) -> Result<(), ServiceError>;
}

impl Validate for CreateAuthorInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .required("name", &self.name, AUTHOR_NAME_LEN)
            .finish()
    }
}

impl Validate for UpdateAuthorInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .optional("name", self.name.as_deref(), AUTHOR_NAME_LEN)
            .finish()
    }
}

impl Validate for CreateTagInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .required("name", &self.name, TAG_NAME_LEN)
            .finish()
    }
}

impl Validate for UpdateTagInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .optional("name", self.name.as_deref(), TAG_NAME_LEN)
            .finish()
    }
}

impl Validate for CreateNewsInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .required("title", &self.title, NEWS_TITLE_LEN)
            .required("content", &self.content, NEWS_CONTENT_LEN)
            .required("author", &self.author, AUTHOR_NAME_LEN)
            .each("tags", &self.tags, TAG_NAME_LEN)
            .finish()
    }
}

impl Validate for UpdateNewsInput {
    fn validate(&self) -> Result<(), ServiceError> {
        let mut validator = Validator::new();
        validator
            .optional("title", self.title.as_deref(), NEWS_TITLE_LEN)
            .optional("content", self.content.as_deref(), NEWS_CONTENT_LEN)
            .optional("author", self.author.as_deref(), AUTHOR_NAME_LEN);
        if let Some(tags) = &self.tags {
            validator.each("tags", tags, TAG_NAME_LEN);
        }
        validator.finish()
    }
}

impl Validate for CreateCommentInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .required("content", &self.content, COMMENT_CONTENT_LEN)
            .finish()
    }
}

impl Validate for UpdateCommentInput {
    fn validate(&self) -> Result<(), ServiceError> {
        Validator::new()
            .optional("content", self.content.as_deref(), COMMENT_CONTENT_LEN)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field_names(err: ServiceError) -> Vec<String> {
        match err {
            ServiceError::ValidationFailed(errors) => errors.into_iter().map(|e| e.field).collect(),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_required_bounds() {
        assert!(Validator::new().required("name", "Bob", AUTHOR_NAME_LEN).finish().is_ok());
        assert!(Validator::new().required("name", "Bo", AUTHOR_NAME_LEN).finish().is_err());
        assert!(Validator::new()
            .required("name", "   ", AUTHOR_NAME_LEN)
            .finish()
            .is_err());
        assert!(Validator::new()
            .required("name", "Sixteen chars!!!", AUTHOR_NAME_LEN)
            .finish()
            .is_err());
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // five characters, ten bytes
        assert!(Validator::new()
            .required("title", "ÄÖÜäö", NEWS_TITLE_LEN)
            .finish()
            .is_ok());
    }

    #[test]
    fn test_optional_skips_blank() {
        assert!(Validator::new().optional("title", None, NEWS_TITLE_LEN).finish().is_ok());
        assert!(Validator::new().optional("title", Some(" "), NEWS_TITLE_LEN).finish().is_ok());
        assert!(Validator::new().optional("title", Some("Tiny"), NEWS_TITLE_LEN).finish().is_err());
    }

    #[test]
    fn test_collects_all_errors() {
        let tags = vec!["ok tag".to_string(), "x".to_string(), "".to_string()];
        let err = Validator::new()
            .required("title", "Hi", NEWS_TITLE_LEN)
            .required("author", "", AUTHOR_NAME_LEN)
            .each("tags", &tags, TAG_NAME_LEN)
            .finish()
            .unwrap_err();

        assert_eq!(field_names(err), vec!["title", "author", "tags[1]"]);
    }

    #[test]
    fn test_create_news_payload() {
        let valid = CreateNewsInput {
            title: "Java 21 released".into(),
            content: "Virtual threads are final".into(),
            author: "Gosling".into(),
            tags: vec!["Technology".into()],
        };
        assert!(valid.validate().is_ok());

        let invalid = CreateNewsInput {
            title: "Java".into(),
            author: " ".into(),
            ..valid
        };
        assert_eq!(field_names(invalid.validate().unwrap_err()), vec!["title", "author"]);
    }

    #[test]
    fn test_update_news_payload_skips_blank_fields() {
        let patch = UpdateNewsInput {
            title: Some("".into()),
            content: Some("Only the content changes".into()),
            author: None,
            tags: None,
        };
        assert!(patch.validate().is_ok());

        let bad_tags = UpdateNewsInput {
            tags: Some(vec!["ok tag".into(), "no".into()]),
            ..Default::default()
        };
        assert_eq!(field_names(bad_tags.validate().unwrap_err()), vec!["tags[1]"]);
    }

    #[test]
    fn test_simple_payloads() {
        assert!(CreateAuthorInput { name: "Gosling".into() }.validate().is_ok());
        assert!(CreateAuthorInput { name: "Al".into() }.validate().is_err());
        assert!(UpdateAuthorInput { name: None }.validate().is_ok());
        assert!(CreateTagInput { name: "Sixteen chars!!!".into() }.validate().is_err());
        assert!(UpdateTagInput { name: Some("Rust".into()) }.validate().is_ok());
        assert!(CreateCommentInput { content: "Nice!".into(), news_id: 1 }.validate().is_ok());
        assert!(CreateCommentInput { content: "Hi".into(), news_id: 1 }.validate().is_err());
        assert!(UpdateCommentInput { content: Some("x".into()) }.validate().is_err());
    }
}
