//! SQLite BM25 corpus statistics store.

use std::path::Path;

use async_trait::async_trait;
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::error::NewsrankResult;
use crate::traits::{CorpusStats, CorpusStore, TermStats};

use super::{lock, open_connection, open_in_memory, placeholders, SharedConnection, MAX_BOUND_IDS};

/// Term dictionary and corpus statistics written by the indexing job.
#[derive(Clone)]
pub struct SqliteCorpusStore {
    conn: SharedConnection,
}

impl SqliteCorpusStore {
    /// Open the store at `path`.
    pub fn new(path: impl AsRef<Path>) -> NewsrankResult<Self> {
        Self::with_connection(open_connection(path)?)
    }

    /// Create an in-memory store (for testing)
    pub fn in_memory() -> NewsrankResult<Self> {
        Self::with_connection(open_in_memory()?)
    }

    /// Use an existing connection, creating the tables if needed.
    pub fn with_connection(conn: SharedConnection) -> NewsrankResult<Self> {
        let store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&self) -> NewsrankResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS bm25_terms (
                term TEXT PRIMARY KEY,
                term_id INTEGER NOT NULL UNIQUE,
                doc_freq INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS bm25_stats (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                total_docs INTEGER NOT NULL,
                k1 REAL NOT NULL,
                b REAL NOT NULL
            );
        "#,
        )?;
        Ok(())
    }

    /// Insert or update one term.
    pub async fn upsert_term(&self, term: &str, term_id: u32, doc_freq: u64) -> NewsrankResult<()> {
        let conn = self.conn.clone();
        let term = term.to_string();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute(
                r#"
                INSERT INTO bm25_terms (term, term_id, doc_freq) VALUES (?1, ?2, ?3)
                ON CONFLICT(term) DO UPDATE SET
                    term_id = excluded.term_id,
                    doc_freq = excluded.doc_freq
                "#,
                params![term, term_id as i64, doc_freq as i64],
            )?;
            Ok(())
        })
        .await?
    }

    /// Replace the corpus statistics.
    pub async fn set_stats(&self, stats: CorpusStats) -> NewsrankResult<()> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            conn.execute(
                r#"
                INSERT INTO bm25_stats (id, total_docs, k1, b) VALUES (1, ?1, ?2, ?3)
                ON CONFLICT(id) DO UPDATE SET
                    total_docs = excluded.total_docs,
                    k1 = excluded.k1,
                    b = excluded.b
                "#,
                params![stats.total_docs as i64, stats.k1 as f64, stats.b as f64],
            )?;
            Ok(())
        })
        .await?
    }
}

/// Read an integer column, rejecting values outside `T`'s range instead of
/// wrapping.
fn checked_column<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: TryFrom<i64>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    let value: i64 = row.get(idx)?;
    T::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

#[async_trait]
impl CorpusStore for SqliteCorpusStore {
    async fn lookup_terms(&self, terms: &[String]) -> NewsrankResult<Vec<TermStats>> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.clone();
        let terms = terms.to_vec();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let mut found = Vec::new();
            for chunk in terms.chunks(MAX_BOUND_IDS) {
                let sql = format!(
                    "SELECT term, term_id, doc_freq FROM bm25_terms WHERE term IN ({})",
                    placeholders(chunk.len())
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                    Ok(TermStats {
                        term: row.get(0)?,
                        term_id: checked_column(row, 1)?,
                        doc_freq: checked_column(row, 2)?,
                    })
                })?;
                for row in rows {
                    found.push(row?);
                }
            }
            Ok(found)
        })
        .await?
    }

    /// An empty corpus reports zero documents with the default k1 and b.
    async fn stats(&self) -> NewsrankResult<CorpusStats> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let stats = conn
                .query_row(
                    "SELECT total_docs, k1, b FROM bm25_stats WHERE id = 1",
                    [],
                    |row| {
                        Ok(CorpusStats {
                            total_docs: checked_column(row, 0)?,
                            k1: row.get::<_, f64>(1)? as f32,
                            b: row.get::<_, f64>(2)? as f32,
                        })
                    },
                )
                .optional()?;
            Ok(stats.unwrap_or_default())
        })
        .await?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use crate::store::SqliteArticleStore;

    #[tokio::test]
    async fn test_lookup_omits_unknown_terms() {
        let store = SqliteCorpusStore::in_memory().unwrap();
        store.upsert_term("ai", 1, 100).await.unwrap();
        store.upsert_term("news", 2, 200).await.unwrap();

        let mut found = store
            .lookup_terms(&["news".to_string(), "ai".to_string(), "zebra".to_string()])
            .await
            .unwrap();
        found.sort_by_key(|t| t.term_id);

        assert_eq!(found.len(), 2);
        assert_eq!(found[0].term, "ai");
        assert_eq!(found[0].doc_freq, 100);
        assert_eq!(found[1].term_id, 2);
    }

    #[tokio::test]
    async fn test_upsert_term_updates_doc_freq() {
        let store = SqliteCorpusStore::in_memory().unwrap();
        store.upsert_term("ai", 1, 100).await.unwrap();
        store.upsert_term("ai", 1, 150).await.unwrap();

        let found = store.lookup_terms(&["ai".to_string()]).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].doc_freq, 150);
    }

    #[tokio::test]
    async fn test_stats_default_until_set() {
        let store = SqliteCorpusStore::in_memory().unwrap();
        assert_eq!(store.stats().await.unwrap(), CorpusStats::default());

        store
            .set_stats(CorpusStats {
                total_docs: 1000,
                k1: 1.5,
                b: 0.8,
            })
            .await
            .unwrap();
        store
            .set_stats(CorpusStats {
                total_docs: 1200,
                k1: 1.5,
                b: 0.8,
            })
            .await
            .unwrap();

        let stats = store.stats().await.unwrap();
        assert_eq!(stats.total_docs, 1200);
        assert!((stats.k1 - 1.5).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_out_of_range_rows_are_database_errors() {
        let store = SqliteCorpusStore::in_memory().unwrap();
        {
            let conn = lock(&store.conn).unwrap();
            conn.execute(
                "INSERT INTO bm25_terms (term, term_id, doc_freq) VALUES ('big', ?1, 5)",
                params![i64::from(u32::MAX) + 1],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO bm25_terms (term, term_id, doc_freq) VALUES ('neg', 7, -3)",
                [],
            )
            .unwrap();
        }

        for term in ["big", "neg"] {
            let err = store.lookup_terms(&[term.to_string()]).await.unwrap_err();
            assert_eq!(err.code(), ErrorCode::DbOperationFailed);
        }

        {
            let conn = lock(&store.conn).unwrap();
            conn.execute(
                "INSERT INTO bm25_stats (id, total_docs, k1, b) VALUES (1, -1, 1.2, 0.75)",
                [],
            )
            .unwrap();
        }
        let err = store.stats().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::DbOperationFailed);
    }

    #[tokio::test]
    async fn test_shares_connection_with_article_store() {
        let conn = crate::store::open_in_memory().unwrap();
        let corpus = SqliteCorpusStore::with_connection(conn.clone()).unwrap();
        let articles = SqliteArticleStore::with_connection(conn).unwrap();

        corpus.upsert_term("ai", 1, 10).await.unwrap();
        assert_eq!(articles.count().await.unwrap(), 0);
        assert_eq!(corpus.lookup_terms(&["ai".to_string()]).await.unwrap().len(), 1);
    }
}
