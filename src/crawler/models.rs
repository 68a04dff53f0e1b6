use crate::crawler::FetchError;

/// One fetched listing page. Lives until it is decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub city: String,
    /// 1-based.
    pub index: u32,
    pub content: String,
}

/// A page given up on after its retry budget ran out.
#[derive(Debug, Clone)]
pub struct PageFailure {
    pub index: u32,
    pub attempts: u32,
    pub last_error: FetchError,
}

/// Outcome of crawling one city. `pages` is in index order.
#[derive(Debug, Clone, Default)]
pub struct CrawlReport {
    pub city: String,
    pub pages: Vec<Page>,
    pub failures: Vec<PageFailure>,
}

impl CrawlReport {
    pub fn pages_fetched(&self) -> usize {
        self.pages.len()
    }

    pub fn pages_failed(&self) -> usize {
        self.failures.len()
    }
}
