mod kv;
mod sites;

pub use kv::{FileKvStore, KvStore, MemoryKvStore, StorageError};
pub use sites::{SiteStore, SITES_KEY};
