//! Durable sink: sqlite table keyed by `job_url`.
//!
//! Re-scraping a known listing is never a duplicate row. The default
//! policy ignores the new copy (idempotent re-runs do not churn
//! already-seen listings); overwrite mode refreshes the stored fields
//! and is an explicit opt-in.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use tracing::info;

use crate::extract::ExtractedRecord;

/// What to do when an incoming record's `job_url` already has a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep the first-seen row untouched.
    Ignore,
    /// Replace the stored fields with the incoming record's.
    Overwrite,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistResult {
    Inserted,
    /// Known `job_url`, ignore policy: the existing row was kept.
    Skipped,
    /// Known `job_url`, overwrite policy: the existing row was refreshed.
    Replaced,
}

/// One stored listing, as read back from the table. Test-only: the
/// binary never reads rows back, it only counts them.
#[cfg(test)]
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct JobRow {
    pub id: i64,
    pub source: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub salary: String,
    pub snippet: String,
    pub job_url: String,
    pub compatibility: Option<String>,
    pub scraped_at: String,
}

#[derive(Clone)]
pub struct JobStore {
    pool: SqlitePool,
}

impl JobStore {
    /// Connects and ensures the jobs table exists.
    pub async fn connect(database_url: &str) -> Result<Self, sqlx::Error> {
        info!("Connecting to sqlite at {database_url}...");
        // Single connection: the pipeline writes sequentially, and an
        // in-memory database only exists on the connection that made it.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                source TEXT NOT NULL,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                location TEXT NOT NULL,
                salary TEXT NOT NULL,
                snippet TEXT NOT NULL,
                job_url TEXT NOT NULL UNIQUE,
                compatibility TEXT,
                scraped_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        info!("Job store ready");
        Ok(Self { pool })
    }

    /// Upserts one record, keyed by `job_url`. A conflicting key is
    /// resolved by `policy` and never surfaced as an error.
    pub async fn persist(
        &self,
        record: &ExtractedRecord,
        policy: DedupPolicy,
    ) -> Result<PersistResult, sqlx::Error> {
        let job_url = record.get_or_sentinel("job_url");

        match policy {
            DedupPolicy::Ignore => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO jobs
                        (source, title, company, location, salary, snippet, job_url, compatibility, scraped_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(job_url) DO NOTHING
                    "#,
                )
                .bind(&record.source)
                .bind(record.get_or_sentinel("title"))
                .bind(record.get_or_sentinel("company"))
                .bind(record.get_or_sentinel("location"))
                .bind(record.get_or_sentinel("salary"))
                .bind(record.get_or_sentinel("snippet"))
                .bind(job_url)
                .bind(record.compatibility.as_deref())
                .bind(record.scraped_at.to_rfc3339())
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 0 {
                    Ok(PersistResult::Skipped)
                } else {
                    Ok(PersistResult::Inserted)
                }
            }
            DedupPolicy::Overwrite => {
                let existed: bool =
                    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM jobs WHERE job_url = ?)")
                        .bind(job_url)
                        .fetch_one(&self.pool)
                        .await?;

                sqlx::query(
                    r#"
                    INSERT INTO jobs
                        (source, title, company, location, salary, snippet, job_url, compatibility, scraped_at)
                    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                    ON CONFLICT(job_url) DO UPDATE SET
                        source = excluded.source,
                        title = excluded.title,
                        company = excluded.company,
                        location = excluded.location,
                        salary = excluded.salary,
                        snippet = excluded.snippet,
                        compatibility = excluded.compatibility,
                        scraped_at = excluded.scraped_at
                    "#,
                )
                .bind(&record.source)
                .bind(record.get_or_sentinel("title"))
                .bind(record.get_or_sentinel("company"))
                .bind(record.get_or_sentinel("location"))
                .bind(record.get_or_sentinel("salary"))
                .bind(record.get_or_sentinel("snippet"))
                .bind(job_url)
                .bind(record.compatibility.as_deref())
                .bind(record.scraped_at.to_rfc3339())
                .execute(&self.pool)
                .await?;

                if existed {
                    Ok(PersistResult::Replaced)
                } else {
                    Ok(PersistResult::Inserted)
                }
            }
        }
    }

    pub async fn count(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM jobs")
            .fetch_one(&self.pool)
            .await
    }

    #[cfg(test)]
    pub async fn fetch_all(&self) -> Result<Vec<JobRow>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM jobs ORDER BY id")
            .fetch_all(&self.pool)
            .await
    }
}
