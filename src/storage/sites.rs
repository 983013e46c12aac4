//! Site collection operations over the key-value store.
//!
//! The whole collection lives under one key as a JSON array and every
//! mutation is a read-modify-write of that document. A mutex serializes the
//! cycles so two concurrent imports cannot overwrite each other's additions;
//! a failed `put` propagates to the caller and nothing is written.

use std::sync::{Mutex, MutexGuard};

use crate::bookmarks::{
    merge_unique, normalize_url, parse_bookmarks_html, ImportSummary, NewSite, Site,
};

use super::kv::{KvStore, StorageError};

/// Key holding the whole site collection
pub const SITES_KEY: &str = "all_sites";

/// CRUD and import operations for the persisted site collection
pub struct SiteStore {
    store: Mutex<Box<dyn KvStore + Send + Sync>>,
}

impl SiteStore {
    pub fn new(store: Box<dyn KvStore + Send + Sync>) -> Self {
        Self {
            store: Mutex::new(store),
        }
    }

    fn store(&self) -> MutexGuard<'_, Box<dyn KvStore + Send + Sync>> {
        self.store.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All stored sites. An absent or unreadable document is an empty
    /// collection, never an error.
    pub fn list(&self) -> Result<Vec<Site>, StorageError> {
        let store = self.store();
        Self::load(&**store)
    }

    /// Add a single site, normalizing a bare host URL to https
    pub fn add(&self, new: NewSite) -> Result<Site, StorageError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(StorageError::InvalidSite("name must not be empty".into()));
        }
        if new.url.trim().is_empty() {
            return Err(StorageError::InvalidSite("url must not be empty".into()));
        }

        let site = Site::new(
            name.to_string(),
            normalize_url(&new.url),
            new.category.trim().to_string(),
        );

        let store = self.store();
        let mut sites = Self::load(&**store)?;
        sites.push(site.clone());
        Self::save(&**store, &sites)?;

        log::info!("Added site '{}' ({})", site.name, site.url);
        Ok(site)
    }

    /// Replace the site with the matching id wholesale, returning the
    /// updated collection
    pub fn update(&self, mut updated: Site) -> Result<Vec<Site>, StorageError> {
        updated.url = normalize_url(&updated.url);

        let store = self.store();
        let mut sites = Self::load(&**store)?;

        let slot = sites
            .iter_mut()
            .find(|site| site.id == updated.id)
            .ok_or_else(|| StorageError::NotFound(updated.id.clone()))?;
        *slot = updated;

        Self::save(&**store, &sites)?;
        Ok(sites)
    }

    /// Delete sites by id, returning how many were removed
    pub fn delete(&self, ids: &[String]) -> Result<usize, StorageError> {
        let store = self.store();
        let mut sites = Self::load(&**store)?;

        let before = sites.len();
        sites.retain(|site| !ids.contains(&site.id));
        let removed = before - sites.len();

        Self::save(&**store, &sites)?;
        log::info!("Deleted {} site(s)", removed);
        Ok(removed)
    }

    /// Parse bookmark-export HTML and merge the entries into the collection.
    ///
    /// Empty input is rejected before anything is read or written. Parse
    /// problems never fail the import; they just yield fewer entries.
    pub fn import_html(&self, html: &str) -> Result<ImportSummary, StorageError> {
        if html.trim().is_empty() {
            return Err(StorageError::EmptyImport);
        }

        let parsed = parse_bookmarks_html(html);

        let store = self.store();
        let existing = Self::load(&**store)?;
        let outcome = merge_unique(existing, parsed);
        Self::save(&**store, &outcome.merged)?;

        log::info!(
            "Imported {} bookmark(s), skipped {} duplicate(s)",
            outcome.imported,
            outcome.skipped
        );
        Ok(ImportSummary {
            imported: outcome.imported,
            skipped: outcome.skipped,
        })
    }

    fn load(store: &dyn KvStore) -> Result<Vec<Site>, StorageError> {
        match store.get(SITES_KEY)? {
            None => Ok(Vec::new()),
            Some(text) => match serde_json::from_str(&text) {
                Ok(sites) => Ok(sites),
                Err(err) => {
                    log::warn!("Stored site collection is unreadable, treating as empty: {}", err);
                    Ok(Vec::new())
                }
            },
        }
    }

    fn save(store: &dyn KvStore, sites: &[Site]) -> Result<(), StorageError> {
        store.put(SITES_KEY, &serde_json::to_string(sites)?)
    }
}
