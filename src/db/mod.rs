pub mod connection;
pub mod crawls;
pub mod pages;

pub use connection::Database;
pub use crawls::{CrawlLog, NoCrawlLog, SqliteCrawlLog};
pub use pages::{MemoryPageStore, PageStore, SqlitePageStore};
