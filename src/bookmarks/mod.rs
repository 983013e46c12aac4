//! Bookmark domain logic: browser-export HTML import and collection merging.

mod import;
mod merge;
mod models;

pub use import::parse_bookmarks_html;
pub use merge::{merge_unique, MergeOutcome};
pub use models::{normalize_url, ImportSummary, NewSite, ParsedBookmark, Site};
