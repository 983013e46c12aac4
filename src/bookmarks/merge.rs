//! Deduplicating merge of parsed bookmarks into an existing collection.

use std::collections::HashSet;

use super::models::{ParsedBookmark, Site};

/// Separator between the url and name halves of a duplicate signature.
const SIGNATURE_SEP: char = '\u{1f}';

/// Result of merging a parsed batch into an existing collection.
#[derive(Debug)]
pub struct MergeOutcome {
    /// Existing records unchanged, followed by newly imported ones in their
    /// original relative order.
    pub merged: Vec<Site>,
    /// Number of incoming entries added.
    pub imported: usize,
    /// Number of incoming entries dropped as duplicates.
    pub skipped: usize,
}

/// Merge `incoming` entries into `existing`, deduplicating on the
/// case-insensitive `(url, name)` pair.
///
/// A same-URL-different-name bookmark is distinct and gets imported.
/// Existing records keep their ids and timestamps; new records get fresh
/// ones. Merging the same batch twice imports nothing the second time.
pub fn merge_unique(existing: Vec<Site>, incoming: Vec<ParsedBookmark>) -> MergeOutcome {
    let mut seen: HashSet<String> = existing
        .iter()
        .map(|site| signature(&site.url, &site.name))
        .collect();

    let mut merged = existing;
    let mut imported = 0;
    let mut skipped = 0;

    for entry in incoming {
        let sig = signature(&entry.url, &entry.name);
        if seen.contains(&sig) {
            skipped += 1;
            continue;
        }
        seen.insert(sig);
        merged.push(Site::new(entry.name, entry.url, entry.category));
        imported += 1;
    }

    MergeOutcome {
        merged,
        imported,
        skipped,
    }
}

fn signature(url: &str, name: &str) -> String {
    format!(
        "{}{}{}",
        url.trim().to_lowercase(),
        SIGNATURE_SEP,
        name.trim().to_lowercase()
    )
}
