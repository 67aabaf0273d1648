//! News posts shown on the site's landing and news pages.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A published news post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsPost {
    /// Post id, assigned by the store.
    pub id: i64,

    /// Headline.
    pub title: String,

    /// Body text.
    pub content: String,

    /// Byline shown under the headline.
    pub author: String,

    /// Optional header image path.
    pub image: Option<String>,

    /// Section, e.g. `general`, `events`, `updates`.
    pub category: String,

    /// Whether the post is pinned to the landing page.
    pub is_featured: bool,

    /// When the post was published.
    pub created_at: DateTime<Utc>,

    /// When the post was last edited.
    pub updated_at: DateTime<Utc>,
}

/// Input for publishing a post; the store assigns id and timestamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewsDraft {
    /// Headline.
    pub title: String,
    /// Body text.
    pub content: String,
    /// Byline. Defaults to the staff byline.
    #[serde(default = "default_author")]
    pub author: String,
    /// Optional header image path.
    pub image: Option<String>,
    /// Section name. Defaults to `general`.
    #[serde(default = "default_category")]
    pub category: String,
    /// Pin to the landing page.
    #[serde(default)]
    pub is_featured: bool,
}

fn default_author() -> String {
    "Staff".to_owned()
}

fn default_category() -> String {
    "general".to_owned()
}

impl NewsDraft {
    /// Check the draft before it reaches the store.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainError`] when the title or body is empty.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.title.trim().is_empty() {
            return Err(DomainError::MissingField("title"));
        }
        if self.content.trim().is_empty() {
            return Err(DomainError::MissingField("content"));
        }
        Ok(())
    }
}
