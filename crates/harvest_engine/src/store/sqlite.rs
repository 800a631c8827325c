use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use harvest_core::Record;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::{StoreBackend, StoreError};

const SCHEMA: &str = r"
    CREATE TABLE IF NOT EXISTS articles (
        id TEXT PRIMARY KEY NOT NULL,
        fetched_at TEXT NOT NULL,
        published_at TEXT NOT NULL,
        title TEXT NOT NULL,
        excerpt TEXT NOT NULL,
        url TEXT NOT NULL,
        image_url TEXT NOT NULL,
        content TEXT NOT NULL DEFAULT ''
    )
";

#[derive(sqlx::FromRow)]
struct ArticleRow {
    id: String,
    fetched_at: DateTime<Utc>,
    published_at: NaiveDateTime,
    title: String,
    excerpt: String,
    url: String,
    image_url: String,
    content: String,
}

impl From<ArticleRow> for Record {
    fn from(row: ArticleRow) -> Self {
        Record {
            id: row.id,
            fetched_at: row.fetched_at,
            published_at: row.published_at,
            title: row.title,
            excerpt: row.excerpt,
            url: row.url,
            image_url: row.image_url,
            content: row.content,
        }
    }
}

/// `articles` table keyed by record id. Persisting writes only the changed
/// rows, all inside one transaction.
#[derive(Debug, Clone)]
pub struct SqliteBackend {
    pool: SqlitePool,
    url: String,
}

impl SqliteBackend {
    /// Opens (creating when missing) the database at `url`, e.g.
    /// `sqlite://data/articles.db`, and ensures the table exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self {
            pool,
            url: url.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl StoreBackend for SqliteBackend {
    fn describe(&self) -> String {
        self.url.clone()
    }

    async fn load(&self) -> Result<Vec<Record>, StoreError> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r"
            SELECT id, fetched_at, published_at, title, excerpt, url, image_url, content
            FROM articles
            ORDER BY rowid
            ",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(Record::from).collect())
    }

    async fn persist(&self, _all: &[Record], changed: &[&Record]) -> Result<(), StoreError> {
        if changed.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool.begin().await?;
        for record in changed {
            sqlx::query(
                r"
                INSERT INTO articles
                (id, fetched_at, published_at, title, excerpt, url, image_url, content)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                ON CONFLICT(id) DO UPDATE SET
                    fetched_at = excluded.fetched_at,
                    published_at = excluded.published_at,
                    title = excluded.title,
                    excerpt = excluded.excerpt,
                    url = excluded.url,
                    image_url = excluded.image_url,
                    content = excluded.content
                ",
            )
            .bind(&record.id)
            .bind(record.fetched_at)
            .bind(record.published_at)
            .bind(&record.title)
            .bind(&record.excerpt)
            .bind(&record.url)
            .bind(&record.image_url)
            .bind(&record.content)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }
}
