use crate::db::connection::Database;
use crate::errors::StoreError;
use rusqlite::{params, Connection};

#[derive(Debug)]
pub struct CrawlRun {
    pub id: i64,
    pub city: String,
    pub started_at: i64,
    pub finished_at: Option<i64>,
    pub pages_fetched: Option<i64>,
    pub pages_failed: Option<i64>,
}

#[derive(Debug)]
pub struct PageFailureRow {
    pub run_id: i64,
    pub city: String,
    pub page_index: u32,
    pub attempts: u32,
    pub error: String,
}

pub fn start_crawl_run(conn: &Connection, city: &str, now: i64) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO crawl_runs (city, started_at) VALUES (?, ?)",
        params![city, now],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn end_crawl_run(
    conn: &Connection,
    run_id: i64,
    now: i64,
    pages_fetched: usize,
    pages_failed: usize,
) -> Result<(), StoreError> {
    conn.execute(
        "UPDATE crawl_runs SET finished_at = ?, pages_fetched = ?, pages_failed = ? WHERE id = ?",
        params![now, pages_fetched, pages_failed, run_id],
    )?;
    Ok(())
}

pub fn record_page_failure(
    conn: &Connection,
    run_id: i64,
    city: &str,
    page_index: u32,
    attempts: u32,
    error: &str,
    now: i64,
) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO page_failures (run_id, city, page_index, attempts, error, failed_at) VALUES (?, ?, ?, ?, ?, ?)",
        params![run_id, city, page_index, attempts, error, now],
    )?;
    Ok(())
}

pub fn get_recent_crawls(conn: &Connection) -> Result<Vec<CrawlRun>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT id, city, started_at, finished_at, pages_fetched, pages_failed FROM crawl_runs ORDER BY id DESC LIMIT 50",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok(CrawlRun {
            id: row.get(0)?,
            city: row.get(1)?,
            started_at: row.get(2)?,
            finished_at: row.get(3)?,
            pages_fetched: row.get(4)?,
            pages_failed: row.get(5)?,
        })
    })?;

    let mut runs = Vec::new();
    for r in rows {
        runs.push(r?);
    }
    Ok(runs)
}

pub fn get_page_failures(conn: &Connection, run_id: i64) -> Result<Vec<PageFailureRow>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT run_id, city, page_index, attempts, error FROM page_failures WHERE run_id = ? ORDER BY page_index",
    )?;

    let rows = stmt.query_map(params![run_id], |row| {
        Ok(PageFailureRow {
            run_id: row.get(0)?,
            city: row.get(1)?,
            page_index: row.get(2)?,
            attempts: row.get(3)?,
            error: row.get(4)?,
        })
    })?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Run log sink used by the scheduler. Logging is best-effort: a failing
/// write is reported and the crawl continues.
pub trait CrawlLog: Send + Sync {
    fn start(&self, city: &str, now: i64) -> Option<i64>;
    fn page_failed(&self, run_id: Option<i64>, city: &str, page: u32, attempts: u32, error: &str, now: i64);
    fn finish(&self, run_id: Option<i64>, now: i64, fetched: usize, failed: usize);
}

/// Discards everything.
pub struct NoCrawlLog;

impl CrawlLog for NoCrawlLog {
    fn start(&self, _city: &str, _now: i64) -> Option<i64> {
        None
    }
    fn page_failed(&self, _: Option<i64>, _: &str, _: u32, _: u32, _: &str, _: i64) {}
    fn finish(&self, _: Option<i64>, _: i64, _: usize, _: usize) {}
}

pub struct SqliteCrawlLog {
    db: Database,
}

impl SqliteCrawlLog {
    pub fn new(db: Database) -> Result<Self, StoreError> {
        db.init()?;
        Ok(Self { db })
    }
}

impl CrawlLog for SqliteCrawlLog {
    fn start(&self, city: &str, now: i64) -> Option<i64> {
        self.db
            .with_conn(|conn| start_crawl_run(conn, city, now))
            .map_err(|e| tracing::warn!(%city, "could not record crawl start: {e}"))
            .ok()
    }

    fn page_failed(&self, run_id: Option<i64>, city: &str, page: u32, attempts: u32, error: &str, now: i64) {
        let Some(run_id) = run_id else { return };
        if let Err(e) = self
            .db
            .with_conn(|conn| record_page_failure(conn, run_id, city, page, attempts, error, now))
        {
            tracing::warn!(%city, page, "could not record page failure: {e}");
        }
    }

    fn finish(&self, run_id: Option<i64>, now: i64, fetched: usize, failed: usize) {
        let Some(run_id) = run_id else { return };
        if let Err(e) = self
            .db
            .with_conn(|conn| end_crawl_run(conn, run_id, now, fetched, failed))
        {
            tracing::warn!(run_id, "could not record crawl end: {e}");
        }
    }
}
