use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::extract::ListingLayout;

const PAGE_PLACEHOLDERS: [&str; 3] = ["{page}", "{0}", "{}"];

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("url template {0:?} has no page placeholder ({{page}}, {{0}} or {{}})")]
    MissingPlaceholder(String),
    #[error("detail container selector is empty")]
    EmptyDetailContainer,
    #[error("cache refresh interval must be positive, got {0} hours")]
    NonPositiveRefresh(i64),
    #[error("cache refresh interval of {0} hours is out of range")]
    RefreshOutOfRange(i64),
}

/// What to do with a listing item whose fields cannot be read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum MalformedItemPolicy {
    #[default]
    AbortRun,
    SkipItem,
}

/// What to do when a detail page cannot be fetched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetailFailurePolicy {
    /// Leave the record out; the next run tries again.
    #[default]
    SkipRecord,
    StoreWithoutContent,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    pub url_template: String,
    pub page_count: u32,
    pub layout: ListingLayout,
    pub detail_container: String,
    pub cache_refresh_hours: i64,
    pub malformed_item: MalformedItemPolicy,
    pub detail_failure: DetailFailurePolicy,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self {
            url_template: "https://example.org/news?page={page}".to_string(),
            page_count: 1,
            layout: ListingLayout::default(),
            detail_container: "div.article-content".to_string(),
            cache_refresh_hours: 12,
            malformed_item: MalformedItemPolicy::default(),
            detail_failure: DetailFailurePolicy::default(),
        }
    }
}

impl HarvestConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !PAGE_PLACEHOLDERS
            .iter()
            .any(|placeholder| self.url_template.contains(placeholder))
        {
            return Err(ConfigError::MissingPlaceholder(self.url_template.clone()));
        }
        if self.detail_container.trim().is_empty() {
            return Err(ConfigError::EmptyDetailContainer);
        }
        if self.cache_refresh_hours <= 0 {
            return Err(ConfigError::NonPositiveRefresh(self.cache_refresh_hours));
        }
        if TimeDelta::try_hours(self.cache_refresh_hours).is_none() {
            return Err(ConfigError::RefreshOutOfRange(self.cache_refresh_hours));
        }
        Ok(())
    }

    /// Listing URL for a 1-based page index.
    pub fn page_url(&self, page: u32) -> String {
        let page = page.to_string();
        PAGE_PLACEHOLDERS
            .iter()
            .fold(self.url_template.clone(), |url, placeholder| {
                url.replace(placeholder, &page)
            })
    }

    /// Saturates for an unvalidated interval too large to represent.
    pub fn staleness_ttl(&self) -> TimeDelta {
        TimeDelta::try_hours(self.cache_refresh_hours).unwrap_or(TimeDelta::MAX)
    }
}
