use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A harvested article.
///
/// `content` is empty until the detail page has been fetched. It is always
/// serialized so the durable form carries every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub fetched_at: DateTime<Utc>,
    /// Publish time as printed by the source site (no zone information).
    pub published_at: NaiveDateTime,
    pub title: String,
    pub excerpt: String,
    pub url: String,
    pub image_url: String,
    #[serde(default)]
    pub content: String,
}

impl Record {
    pub fn has_content(&self) -> bool {
        !self.content.is_empty()
    }
}
