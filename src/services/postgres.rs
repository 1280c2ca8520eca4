use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{pair_key, Pairing, PairingStatus};
use crate::services::store::{PairingPage, PairingStore, StoreError};

/// Errors that can occur when interacting with PostgreSQL
#[derive(Debug, Error)]
pub enum PostgresError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Corrupt pairing row {id}: {reason}")]
    CorruptRow { id: Uuid, reason: String },
}

impl From<sqlx::Error> for StoreError {
    fn from(value: sqlx::Error) -> Self {
        StoreError::Postgres(PostgresError::SqlxError(value))
    }
}

/// Pairing store backed by PostgreSQL
///
/// Each pairing is one row. The full document lives in a JSONB column;
/// `pair_key`, `status`, `expires_at` and `version` are mirrored into
/// columns for uniqueness, filtering and compare-and-swap updates.
pub struct PostgresPairingStore {
    pool: PgPool,
}

const SELECT_COLUMNS: &str = "SELECT id, status, version, document FROM pairings";

impl PostgresPairingStore {
    /// Connect and run pending migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
        idle_timeout: Duration,
    ) -> Result<Self, PostgresError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(idle_timeout)
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
        idle_timeout_secs: Option<u64>,
    ) -> Result<Self, PostgresError> {
        tracing::info!("Connecting to PostgreSQL pairing store");

        Self::new(
            url,
            max_connections.unwrap_or(10),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(5)),
            Duration::from_secs(idle_timeout_secs.unwrap_or(600)),
        )
        .await
    }

    fn decode(row: &PgRow) -> Result<Pairing, StoreError> {
        let id: Uuid = row.try_get("id")?;
        let Json(mut pairing): Json<Pairing> = row.try_get("document")?;
        let status: String = row.try_get("status")?;

        // Columns win over the document: the expiry sweep only touches columns
        pairing.status = status
            .parse()
            .map_err(|reason| PostgresError::CorruptRow { id, reason })?;
        pairing.version = row.try_get("version")?;
        Ok(pairing)
    }
}

#[async_trait]
impl PairingStore for PostgresPairingStore {
    async fn find_pairing(&self, user_a: &str, user_b: &str) -> Result<Option<Pairing>, StoreError> {
        let query = format!("{} WHERE pair_key = $1", SELECT_COLUMNS);

        let row = sqlx::query(&query)
            .bind(pair_key(user_a, user_b))
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn get_pairing(&self, id: Uuid) -> Result<Option<Pairing>, StoreError> {
        let query = format!("{} WHERE id = $1", SELECT_COLUMNS);

        let row = sqlx::query(&query).bind(id).fetch_optional(&self.pool).await?;

        row.as_ref().map(Self::decode).transpose()
    }

    async fn create_pairing(&self, pairing: &Pairing) -> Result<(), StoreError> {
        let query = r#"
            INSERT INTO pairings (id, pair_key, user_a, user_b, status, expires_at, created_at, version, document)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 1, $8)
            ON CONFLICT (pair_key) DO NOTHING
        "#;

        let result = sqlx::query(query)
            .bind(pairing.id)
            .bind(&pairing.pair_key)
            .bind(&pairing.users[0])
            .bind(&pairing.users[1])
            .bind(pairing.status.as_str())
            .bind(pairing.expires_at)
            .bind(pairing.created_at)
            .bind(Json(pairing))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::DuplicatePair(pairing.pair_key.clone()));
        }

        tracing::debug!("Created pairing {} for {}", pairing.id, pairing.pair_key);
        Ok(())
    }

    async fn save_pairing(&self, pairing: &Pairing) -> Result<(), StoreError> {
        let query = r#"
            UPDATE pairings
            SET status = $3,
                expires_at = $4,
                document = $5,
                version = version + 1
            WHERE id = $1 AND version = $2
        "#;

        let result = sqlx::query(query)
            .bind(pairing.id)
            .bind(pairing.version)
            .bind(pairing.status.as_str())
            .bind(pairing.expires_at)
            .bind(Json(pairing))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::StaleWrite(pairing.id));
        }

        Ok(())
    }

    async fn delete_pairing(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM pairings WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_pairings_for_user(&self, user_id: &str) -> Result<Vec<Pairing>, StoreError> {
        let query = format!("{} WHERE user_a = $1 OR user_b = $1", SELECT_COLUMNS);

        let rows = sqlx::query(&query).bind(user_id).fetch_all(&self.pool).await?;

        rows.iter().map(Self::decode).collect()
    }

    async fn page_pairings_for_user(
        &self,
        user_id: &str,
        status: Option<PairingStatus>,
        offset: u64,
        limit: u64,
    ) -> Result<PairingPage, StoreError> {
        let status = status.map(|s| s.as_str());

        let total: i64 = sqlx::query(
            r#"
            SELECT COUNT(*) AS total
            FROM pairings
            WHERE (user_a = $1 OR user_b = $1)
              AND ($2::text IS NULL OR status = $2)
            "#,
        )
        .bind(user_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await?
        .try_get("total")?;

        let query = format!(
            "{} WHERE (user_a = $1 OR user_b = $1) AND ($2::text IS NULL OR status = $2) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
            SELECT_COLUMNS
        );

        let rows = sqlx::query(&query)
            .bind(user_id)
            .bind(status)
            .bind(limit as i64)
            .bind(offset as i64)
            .fetch_all(&self.pool)
            .await?;

        Ok(PairingPage {
            pairings: rows.iter().map(Self::decode).collect::<Result<_, _>>()?,
            total: total.max(0) as u64,
        })
    }

    async fn expire_pending(&self, now: DateTime<Utc>) -> Result<u64, StoreError> {
        let query = r#"
            UPDATE pairings
            SET status = 'expired',
                document = jsonb_set(document, '{status}', '"expired"'),
                version = version + 1
            WHERE status = 'pending' AND expires_at <= $1
        "#;

        let result = sqlx::query(query).bind(now).execute(&self.pool).await?;

        if result.rows_affected() > 0 {
            tracing::info!("Expired {} stale pending pairings", result.rows_affected());
        }

        Ok(result.rows_affected())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(true)
    }
}
