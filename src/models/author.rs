//! Author model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Author entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Unique identifier
    pub id: i64,
    /// Display name, unique across authors
    pub name: String,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Author {
    /// Create a new author that has not been persisted yet
    pub fn new(name: String) -> Self {
        let now = Utc::now();
        Self {
            id: 0, // Will be set by database
            name,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Input for creating an author
#[derive(Debug, Clone, Deserialize)]
pub struct CreateAuthorInput {
    pub name: String,
}

/// Input for updating an author; a blank or missing name keeps the current one
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateAuthorInput {
    #[serde(default)]
    pub name: Option<String>,
}
