//! Problem record store: trait contract and PostgreSQL adapter.
//!
//! The orchestration layer depends on the [`ProblemStore`] trait, not the
//! concrete adapter, so tests can substitute an in-memory store and the
//! persistence backend stays a contract-only collaborator. The adapter
//! guarantees single-record atomicity per operation and nothing more;
//! concurrent updates to the same row are last-write-wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use thiserror::Error;

use crate::problem::ProblemSummary;

use super::migrations::MigrationRunner;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Connection to the database failed.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed.
    #[error("Query failed: {0}")]
    QueryFailed(#[from] sqlx::Error),

    /// No problem exists with the given identifier.
    #[error("Problem {0} not found")]
    NotFound(i64),

    /// Migration error.
    #[error("Migration error: {0}")]
    Migration(#[from] super::migrations::MigrationError),
}

/// Insert payload for a new problem row.
///
/// `example` and `output` arrive already encoded by the shared codec; the
/// store treats them as opaque bytes.
#[derive(Debug, Clone)]
pub struct NewProblem {
    /// Problem title.
    pub title: String,
    /// Full problem statement.
    pub description: String,
    /// Canonical-encoded example payload.
    pub example: Vec<u8>,
    /// Canonical-encoded expected output payload.
    pub output: Vec<u8>,
    /// Reference solution.
    pub solution: String,
    /// Identity of the creating user.
    pub poster: String,
}

/// A problem row as persisted, blobs still encoded.
#[derive(Debug, Clone)]
pub struct StoredProblem {
    /// Store-assigned identifier.
    pub problem_id: i64,
    /// Problem title.
    pub title: String,
    /// Full problem statement.
    pub description: String,
    /// Canonical-encoded example payload.
    pub example: Vec<u8>,
    /// Canonical-encoded expected output payload.
    pub output: Vec<u8>,
    /// Reference solution.
    pub solution: String,
    /// Identity of the creating user.
    pub poster: String,
    /// Stable reference to the attached data file, if any.
    pub data_reference: Option<String>,
    /// When the row was created.
    pub created_at: DateTime<Utc>,
    /// When the row was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Closed set of partial-update operations.
///
/// A tagged union instead of a field-name map, so the adapter cannot
/// silently accept a typo'd field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProblemPatch {
    /// Sets the data file reference after a successful ingestion.
    SetDataReference(String),
}

/// Contract of the problem record store.
#[async_trait]
pub trait ProblemStore: Send + Sync {
    /// Persists a new problem and returns the assigned identifier.
    async fn create(&self, problem: &NewProblem) -> Result<i64, StoreError>;

    /// Applies a partial update. Fails with [`StoreError::NotFound`] if
    /// the identifier does not exist.
    async fn update(&self, problem_id: i64, patch: ProblemPatch) -> Result<(), StoreError>;

    /// Fetches a single problem row.
    async fn fetch_one(&self, problem_id: i64) -> Result<StoredProblem, StoreError>;

    /// Lists problem summaries ordered by identifier.
    ///
    /// `offset` and `limit` must be non-negative; the caller validates
    /// them before this is reached.
    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ProblemSummary>, StoreError>;

    /// Returns the total number of problems.
    async fn total(&self) -> Result<i64, StoreError>;
}

/// PostgreSQL-backed problem store.
pub struct PgProblemStore {
    pool: PgPool,
}

impl PgProblemStore {
    /// Connects to the database and returns a new store.
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .min_connections(1)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| StoreError::ConnectionFailed(e.to_string()))?;

        Ok(Self { pool })
    }

    /// Creates a store from an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Returns a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs schema migrations.
    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        let runner = MigrationRunner::new(self.pool.clone());
        runner.run_migrations().await?;
        Ok(())
    }
}

#[async_trait]
impl ProblemStore for PgProblemStore {
    async fn create(&self, problem: &NewProblem) -> Result<i64, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO problems (title, description, example, output, solution, poster)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&problem.title)
        .bind(&problem.description)
        .bind(&problem.example)
        .bind(&problem.output)
        .bind(&problem.solution)
        .bind(&problem.poster)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get("id"))
    }

    async fn update(&self, problem_id: i64, patch: ProblemPatch) -> Result<(), StoreError> {
        let result = match patch {
            ProblemPatch::SetDataReference(reference) => {
                sqlx::query(
                    r#"
                    UPDATE problems
                    SET data_reference = $2, updated_at = NOW()
                    WHERE id = $1
                    "#,
                )
                .bind(problem_id)
                .bind(reference)
                .execute(&self.pool)
                .await?
            }
        };

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(problem_id));
        }

        Ok(())
    }

    async fn fetch_one(&self, problem_id: i64) -> Result<StoredProblem, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT id, title, description, example, output, solution, poster,
                   data_reference, created_at, updated_at
            FROM problems
            WHERE id = $1
            "#,
        )
        .bind(problem_id)
        .fetch_optional(&self.pool)
        .await?;

        let row = match row {
            Some(r) => r,
            None => return Err(StoreError::NotFound(problem_id)),
        };

        Ok(StoredProblem {
            problem_id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            example: row.get("example"),
            output: row.get("output"),
            solution: row.get("solution"),
            poster: row.get("poster"),
            data_reference: row.get("data_reference"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    async fn list(&self, offset: i64, limit: i64) -> Result<Vec<ProblemSummary>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT id, title, poster, data_reference, created_at
            FROM problems
            ORDER BY id
            OFFSET $1 LIMIT $2
            "#,
        )
        .bind(offset)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut summaries = Vec::with_capacity(rows.len());
        for row in rows {
            let data_reference: Option<String> = row.get("data_reference");
            summaries.push(ProblemSummary {
                problem_id: row.get("id"),
                title: row.get("title"),
                poster: row.get("poster"),
                has_data: data_reference.map_or(false, |r| !r.is_empty()),
                created_at: row.get("created_at"),
            });
        }

        Ok(summaries)
    }

    async fn total(&self) -> Result<i64, StoreError> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM problems")
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get("count"))
    }
}
