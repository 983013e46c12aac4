//! Bookmark data models
//!
//! A Site is one bookmarked destination in the persisted collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A bookmarked site stored in the collection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    /// Unique identifier (opaque string, UUID v4)
    pub id: String,

    /// Display name
    pub name: String,

    /// Absolute http(s) URL
    pub url: String,

    /// Flat category label; empty string means uncategorized
    #[serde(default)]
    pub category: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Site {
    /// Create a new site with a fresh id and timestamp
    pub fn new(name: String, url: String, category: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name,
            url,
            category,
            created_at: Utc::now(),
        }
    }
}

/// Creation payload for a site, before id/timestamp assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSite {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub category: String,
}

/// One entry parsed out of bookmark-export HTML
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedBookmark {
    pub name: String,
    pub url: String,
    pub category: String,
}

/// Counts reported after an import merge
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

/// Make a URL absolute: bare `example.com` becomes `https://example.com`.
///
/// Already-absolute http(s) URLs pass through trimmed but otherwise unchanged.
pub fn normalize_url(raw: &str) -> String {
    let url = raw.trim();
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}
