//! SQLite article store.

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use tracing::debug;

use crate::error::{NewsrankError, NewsrankResult};
use crate::traits::ArticleStore;
use crate::types::{Article, Citation};

use super::{lock, open_connection, open_in_memory, placeholders, SharedConnection, MAX_BOUND_IDS};

/// Articles and their citations in SQLite.
///
/// `published_at` is stored as Unix milliseconds so range filters compare
/// integers.
#[derive(Clone)]
pub struct SqliteArticleStore {
    conn: SharedConnection,
}

impl SqliteArticleStore {
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
            CREATE TABLE IF NOT EXISTS articles (
                id TEXT PRIMARY KEY,
                published_at INTEGER NOT NULL,
                title TEXT NOT NULL,
                body TEXT NOT NULL,
                content_fingerprint TEXT NOT NULL DEFAULT '',
                tag TEXT NOT NULL DEFAULT ''
            );

            CREATE INDEX IF NOT EXISTS idx_articles_published
                ON articles(published_at);

            CREATE TABLE IF NOT EXISTS citations (
                article_id TEXT NOT NULL,
                position INTEGER NOT NULL,
                source_name TEXT NOT NULL,
                article_title TEXT NOT NULL,
                url TEXT NOT NULL,
                PRIMARY KEY (article_id, position)
            );
        "#,
        )?;
        Ok(())
    }

    /// Insert or replace an article together with its citations.
    pub async fn upsert_article(&self, article: &Article) -> NewsrankResult<()> {
        let conn = self.conn.clone();
        let article = article.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = lock(&conn)?;
            upsert_blocking(&mut conn, &article)
        })
        .await?
    }

    /// Number of stored articles.
    pub async fn count(&self) -> NewsrankResult<usize> {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM articles", [], |row| row.get(0))?;
            Ok(count as usize)
        })
        .await?
    }
}

fn upsert_blocking(conn: &mut Connection, article: &Article) -> NewsrankResult<()> {
    let tx = conn.transaction()?;
    tx.execute(
        r#"
        INSERT INTO articles (id, published_at, title, body, content_fingerprint, tag)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)
        ON CONFLICT(id) DO UPDATE SET
            published_at = excluded.published_at,
            title = excluded.title,
            body = excluded.body,
            content_fingerprint = excluded.content_fingerprint,
            tag = excluded.tag
        "#,
        params![
            article.id,
            article.published_at.timestamp_millis(),
            article.title,
            article.body,
            article.content_fingerprint,
            article.tag,
        ],
    )?;
    tx.execute("DELETE FROM citations WHERE article_id = ?1", params![article.id])?;
    for (position, citation) in article.citations.iter().enumerate() {
        tx.execute(
            "INSERT INTO citations (article_id, position, source_name, article_title, url) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                article.id,
                position as i64,
                citation.source_name,
                citation.article_title,
                citation.url,
            ],
        )?;
    }
    tx.commit()?;
    Ok(())
}

fn millis_to_datetime(millis: i64) -> NewsrankResult<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| NewsrankError::database(format!("Invalid published_at value {}", millis)))
}

fn find_blocking(
    conn: &Connection,
    ids: &[String],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> NewsrankResult<Vec<Article>> {
    let mut articles = Vec::new();

    for chunk in ids.chunks(MAX_BOUND_IDS) {
        let sql = format!(
            "SELECT id, published_at, title, body, content_fingerprint, tag FROM articles \
             WHERE published_at BETWEEN ? AND ? AND id IN ({})",
            placeholders(chunk.len())
        );
        let mut values = vec![
            Value::Integer(start.timestamp_millis()),
            Value::Integer(end.timestamp_millis()),
        ];
        values.extend(chunk.iter().map(|id| Value::Text(id.clone())));

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(values.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        })?;

        for row in rows {
            let (id, published_at, title, body, fingerprint, tag) = row?;
            articles.push(
                Article::new(id, millis_to_datetime(published_at)?, title, body)
                    .with_fingerprint(fingerprint)
                    .with_tag(tag),
            );
        }
    }

    attach_citations(conn, &mut articles)?;
    Ok(articles)
}

fn attach_citations(conn: &Connection, articles: &mut [Article]) -> NewsrankResult<()> {
    if articles.is_empty() {
        return Ok(());
    }

    let positions: HashMap<String, usize> = articles
        .iter()
        .enumerate()
        .map(|(i, a)| (a.id.clone(), i))
        .collect();
    let found: Vec<String> = articles.iter().map(|a| a.id.clone()).collect();

    for chunk in found.chunks(MAX_BOUND_IDS) {
        let sql = format!(
            "SELECT article_id, source_name, article_title, url FROM citations \
             WHERE article_id IN ({}) ORDER BY article_id, position",
            placeholders(chunk.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
            Ok((
                row.get::<_, String>(0)?,
                Citation::new(
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ),
            ))
        })?;

        for row in rows {
            let (article_id, citation) = row?;
            if let Some(&i) = positions.get(&article_id) {
                articles[i].push_citation(citation);
            }
        }
    }
    Ok(())
}

#[async_trait]
impl ArticleStore for SqliteArticleStore {
    async fn find_by_ids_in_range(
        &self,
        ids: &[String],
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> NewsrankResult<Vec<Article>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let conn = self.conn.clone();
        let ids = ids.to_vec();
        let articles = tokio::task::spawn_blocking(move || {
            let conn = lock(&conn)?;
            find_blocking(&conn, &ids, start, end)
        })
        .await??;

        debug!(found = articles.len(), %start, %end, "Article range lookup");
        Ok(articles)
    }
}
