//! Suite catalogue DAO over sqlite.

use crate::error::Result;
use crate::filter::{compile, FilterExpr};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use tracing::info;

/// Columns a filter may reference.
pub const QUERYABLE_COLUMNS: &[&str] = &[
    "idx", "branch", "revision", "owner", "project", "title", "author", "status",
];

/// One catalogue row: a suite at a branch/revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuiteEntry {
    pub idx: String,
    pub branch: String,
    pub revision: i64,
    pub owner: String,
    pub project: String,
    pub title: String,
    pub author: String,
    pub status: String,
}

/// Data access for the suite catalogue.
pub struct SuiteDao {
    pool: SqlitePool,
}

impl SuiteDao {
    /// Open (or create) a catalogue at the given sqlite URL and ensure
    /// the schema exists.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await?;
        let dao = SuiteDao { pool };
        dao.ensure_schema().await?;
        Ok(dao)
    }

    /// In-memory catalogue for tests.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:").await
    }

    async fn ensure_schema(&self) -> Result<()> {
        sqlx::query(
            r#"CREATE TABLE IF NOT EXISTS suites (
                idx TEXT NOT NULL,
                branch TEXT NOT NULL,
                revision INTEGER NOT NULL,
                owner TEXT NOT NULL,
                project TEXT NOT NULL,
                title TEXT NOT NULL,
                author TEXT NOT NULL,
                status TEXT NOT NULL,
                PRIMARY KEY (idx, branch, revision)
            )"#,
        )
        .execute(&self.pool)
        .await?;
        info!("Catalogue schema verified");
        Ok(())
    }

    pub async fn insert(&self, entry: &SuiteEntry) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO suites (idx, branch, revision, owner, project, title, author, status)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(idx, branch, revision) DO UPDATE SET
                owner = excluded.owner,
                project = excluded.project,
                title = excluded.title,
                author = excluded.author,
                status = excluded.status
            "#,
        )
        .bind(&entry.idx)
        .bind(&entry.branch)
        .bind(entry.revision)
        .bind(&entry.owner)
        .bind(&entry.project)
        .bind(&entry.title)
        .bind(&entry.author)
        .bind(&entry.status)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Query entries matching a filter, ordered by (idx, branch, revision).
    pub async fn query(&self, filter: &FilterExpr) -> Result<Vec<SuiteEntry>> {
        let compiled = compile(filter, QUERYABLE_COLUMNS)?;
        let sql = format!(
            "SELECT idx, branch, revision, owner, project, title, author, status \
             FROM suites WHERE {} ORDER BY idx, branch, revision",
            compiled.sql
        );
        let mut query = sqlx::query(&sql);
        for param in &compiled.params {
            query = query.bind(param);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| {
                Ok(SuiteEntry {
                    idx: row.try_get("idx")?,
                    branch: row.try_get("branch")?,
                    revision: row.try_get("revision")?,
                    owner: row.try_get("owner")?,
                    project: row.try_get("project")?,
                    title: row.try_get("title")?,
                    author: row.try_get("author")?,
                    status: row.try_get("status")?,
                })
            })
            .collect()
    }

    /// All entries, newest revision last.
    pub async fn all(&self) -> Result<Vec<SuiteEntry>> {
        self.query(&FilterExpr::And(Vec::new())).await
    }
}
