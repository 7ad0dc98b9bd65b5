//! Tag model

use serde::{Deserialize, Serialize};

/// Tag entity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    /// Unique identifier
    pub id: i64,
    /// Tag name, unique across tags
    pub name: String,
}

impl Tag {
    /// Create a new tag that has not been persisted yet
    pub fn new(name: String) -> Self {
        Self { id: 0, name }
    }
}

/// Input for creating a tag
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTagInput {
    pub name: String,
}

/// Input for updating a tag
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateTagInput {
    #[serde(default)]
    pub name: Option<String>,
}
