// db/pages.rs
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::db::connection::Database;
use crate::errors::StoreError;

/// Raw page content keyed by (city, page index).
pub trait PageStore: Send + Sync {
    fn put(&self, city: &str, index: u32, content: &str) -> Result<(), StoreError>;
    fn get(&self, city: &str, index: u32) -> Result<Option<String>, StoreError>;
    /// Stored page indices for a city, ascending.
    fn indices(&self, city: &str) -> Result<Vec<u32>, StoreError>;
}

pub struct SqlitePageStore {
    db: Database,
}

impl SqlitePageStore {
    pub fn new(db: Database) -> Result<Self, StoreError> {
        db.init()?;
        Ok(Self { db })
    }
}

impl PageStore for SqlitePageStore {
    fn put(&self, city: &str, index: u32, content: &str) -> Result<(), StoreError> {
        let now = Utc::now().timestamp();
        self.db.with_conn(|conn| {
            conn.execute(
                r#"
                INSERT INTO pages (city, page_index, content, fetched_at)
                VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(city, page_index) DO UPDATE SET
                    content = excluded.content,
                    fetched_at = excluded.fetched_at
                "#,
                params![city, index, content, now],
            )?;
            Ok(())
        })
    }

    fn get(&self, city: &str, index: u32) -> Result<Option<String>, StoreError> {
        self.db.with_conn(|conn| {
            let content = conn
                .query_row(
                    "SELECT content FROM pages WHERE city = ?1 AND page_index = ?2",
                    params![city, index],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(content)
        })
    }

    fn indices(&self, city: &str) -> Result<Vec<u32>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT page_index FROM pages WHERE city = ?1 ORDER BY page_index")?;
            let rows = stmt.query_map(params![city], |row| row.get::<_, u32>(0))?;

            let mut out = Vec::new();
            for r in rows {
                out.push(r?);
            }
            Ok(out)
        })
    }
}

/// In-process store for tests and one-shot runs.
#[derive(Default)]
pub struct MemoryPageStore {
    pages: Mutex<BTreeMap<(String, u32), String>>,
}

impl MemoryPageStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<(String, u32), String>>, StoreError> {
        self.pages
            .lock()
            .map_err(|_| StoreError::Io("page store lock poisoned".into()))
    }
}

impl PageStore for MemoryPageStore {
    fn put(&self, city: &str, index: u32, content: &str) -> Result<(), StoreError> {
        self.lock()?
            .insert((city.to_string(), index), content.to_string());
        Ok(())
    }

    fn get(&self, city: &str, index: u32) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(&(city.to_string(), index)).cloned())
    }

    fn indices(&self, city: &str) -> Result<Vec<u32>, StoreError> {
        Ok(self
            .lock()?
            .keys()
            .filter(|(c, _)| c == city)
            .map(|(_, i)| *i)
            .collect())
    }
}
