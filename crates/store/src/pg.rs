//! Postgres-backed implementation of [`OperationStore`].
//!
//! Queries are runtime-checked (`sqlx::query_as`) so the workspace compiles
//! without a live database.  `updated_at` is refreshed on every mutation.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::info;

use crate::models::{Operation, OperationState};
use crate::{OperationStore, StoreError};

/// Type alias for the shared Postgres pool used across the whole application.
pub type DbPool = PgPool;

/// Create a new connection pool from the given `database_url`.
///
/// `max_connections` controls the pool ceiling.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, StoreError> {
    info!("Connecting to database (max_connections={})", max_connections);
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run embedded SQLx migrations located in `./migrations` (relative to the
/// workspace root at build time).
pub async fn run_migrations(pool: &DbPool) -> Result<(), StoreError> {
    info!("Running database migrations");
    sqlx::migrate!("../../migrations").run(pool).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

/// Raw row shape; `state` stays a string until parsed into the enum.
#[derive(Debug, FromRow)]
struct OperationRow {
    id: String,
    payload: serde_json::Value,
    step: i32,
    state: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OperationRow> for Operation {
    type Error = StoreError;

    fn try_from(row: OperationRow) -> Result<Self, Self::Error> {
        let state: OperationState = row.state.parse().map_err(StoreError::InvalidState)?;
        Ok(Operation {
            id: row.id,
            payload: row.payload,
            step: row.step,
            state,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

// ---------------------------------------------------------------------------
// PgStore
// ---------------------------------------------------------------------------

/// [`OperationStore`] backed by the `operations` Postgres table.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OperationStore for PgStore {
    async fn create(&self, op: &Operation) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO operations (id, payload, step, state, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(&op.id)
        .bind(&op.payload)
        .bind(op.step)
        .bind(op.state.to_string())
        .bind(op.created_at)
        .bind(op.updated_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(StoreError::AlreadyExists)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: &str) -> Result<Operation, StoreError> {
        let row = sqlx::query_as::<_, OperationRow>(
            r#"
            SELECT id, payload, step, state, created_at, updated_at
            FROM operations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn get_latest(&self) -> Result<Operation, StoreError> {
        let row = sqlx::query_as::<_, OperationRow>(
            r#"
            SELECT id, payload, step, state, created_at, updated_at
            FROM operations
            ORDER BY created_at DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?
        .ok_or(StoreError::NotFound)?;

        row.try_into()
    }

    async fn update_state(&self, id: &str, state: OperationState) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE operations SET state = $1, updated_at = $2 WHERE id = $3"#,
        )
        .bind(state.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn update_step(
        &self,
        id: &str,
        step: i32,
        state: OperationState,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r#"UPDATE operations SET step = $1, state = $2, updated_at = $3 WHERE id = $4"#,
        )
        .bind(step)
        .bind(state.to_string())
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn list_unfinished(&self) -> Result<Vec<Operation>, StoreError> {
        let rows = sqlx::query_as::<_, OperationRow>(
            r#"
            SELECT id, payload, step, state, created_at, updated_at
            FROM operations
            WHERE state IN ('PENDING', 'RUNNING')
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Operation::try_from).collect()
    }
}
