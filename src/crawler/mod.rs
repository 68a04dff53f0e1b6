mod crawler_error;
pub mod fetcher;
pub mod models;
pub mod scheduler;

pub use crawler_error::FetchError;
pub use fetcher::{Fetcher, HttpFetcher, RequestProfile};
pub use models::{CrawlReport, Page, PageFailure};
pub use scheduler::{CrawlConfig, CrawlScheduler, Pacing, RetryPolicy, MAX_PACING_SECS};
