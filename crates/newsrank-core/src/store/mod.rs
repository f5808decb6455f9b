//! SQLite-backed article and BM25 corpus stores.
//!
//! Both stores can share one connection so a single database file holds
//! the articles and the corpus statistics. Queries run on the blocking
//! thread pool.

mod sqlite_articles;
mod sqlite_corpus;

pub use sqlite_articles::SqliteArticleStore;
pub use sqlite_corpus::SqliteCorpusStore;

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::error::{ErrorCode, NewsrankError, NewsrankResult};

/// A connection shared between stores.
pub type SharedConnection = Arc<Mutex<Connection>>;

/// Upper bound on ids bound into a single `IN (...)` clause.
const MAX_BOUND_IDS: usize = 500;

/// Open (creating if needed) the database at `path`.
pub fn open_connection(path: impl AsRef<Path>) -> NewsrankResult<SharedConnection> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let conn = Connection::open(path).map_err(|e| NewsrankError::Database {
        message: format!("Failed to open {}: {}", path.display(), e),
        code: ErrorCode::DbConnectionFailed,
        source: Some(Box::new(e)),
    })?;
    Ok(Arc::new(Mutex::new(conn)))
}

/// Open a private in-memory database.
pub fn open_in_memory() -> NewsrankResult<SharedConnection> {
    let conn = Connection::open_in_memory()?;
    Ok(Arc::new(Mutex::new(conn)))
}

fn lock(conn: &SharedConnection) -> NewsrankResult<MutexGuard<'_, Connection>> {
    conn.lock().map_err(|_| NewsrankError::Database {
        message: "Database connection lock poisoned".to_string(),
        code: ErrorCode::DbConnectionFailed,
        source: None,
    })
}

/// `?, ?, ?` with `count` placeholders.
fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}
