pub mod bookmarks;
pub mod server;
pub mod storage;
