//! Postgres-backed revocation store.
//!
//! Rotation exclusivity rides on the conditional `UPDATE ... AND revoked
//! = FALSE`: of two concurrent rotations presenting the same head,
//! exactly one sees `rows_affected = 1`. No in-process coordination is
//! assumed; horizontal replicas coordinate only through these writes.

use crate::error::SessionError;
use crate::refresh::record::RefreshTokenRecord;
use crate::store::RevocationStore;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS refresh_tokens (
    id UUID PRIMARY KEY,
    user_id TEXT NOT NULL,
    email TEXT NOT NULL,
    family_id UUID NOT NULL,
    parent_token_id UUID NULL REFERENCES refresh_tokens (id),
    token_hash TEXT NOT NULL UNIQUE,
    issued_at TIMESTAMPTZ NOT NULL,
    expires_at TIMESTAMPTZ NOT NULL,
    revoked BOOLEAN NOT NULL DEFAULT FALSE
);
CREATE INDEX IF NOT EXISTS refresh_tokens_family_idx ON refresh_tokens (family_id);
CREATE INDEX IF NOT EXISTS refresh_tokens_user_idx ON refresh_tokens (user_id);
";

const SELECT_COLUMNS: &str =
    "id, user_id, email, family_id, parent_token_id, token_hash, issued_at, expires_at, revoked";

/// [`RevocationStore`] over a Postgres pool.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect to Postgres and ensure the ledger schema exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or schema setup fails.
    pub async fn connect(database_url: &str) -> Result<Self, SessionError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::raw_sql(SCHEMA).execute(&pool).await?;

        Ok(PostgresStore { pool })
    }

    /// Wrap an existing pool; schema management is the caller's problem.
    #[must_use]
    pub fn with_pool(pool: PgPool) -> Self {
        PostgresStore { pool }
    }
}

#[async_trait]
impl RevocationStore for PostgresStore {
    async fn find_active_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, SessionError> {
        let sql = format!(
            "SELECT {SELECT_COLUMNS} FROM refresh_tokens \
             WHERE token_hash = $1 AND revoked = FALSE AND expires_at > NOW()"
        );
        let record = sqlx::query_as::<_, RefreshTokenRecord>(&sql)
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn find_any_by_hash(
        &self,
        hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, SessionError> {
        let sql = format!("SELECT {SELECT_COLUMNS} FROM refresh_tokens WHERE token_hash = $1");
        let record = sqlx::query_as::<_, RefreshTokenRecord>(&sql)
            .bind(hash)
            .fetch_optional(&self.pool)
            .await?;
        Ok(record)
    }

    async fn revise_to_revoked(&self, id: Uuid) -> Result<bool, SessionError> {
        let result =
            sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE id = $1 AND revoked = FALSE")
                .bind(id)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn revise_family_to_revoked(&self, family_id: Uuid) -> Result<u64, SessionError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE family_id = $1 AND revoked = FALSE",
        )
        .bind(family_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn revise_user_to_revoked(&self, user_id: &str) -> Result<u64, SessionError> {
        let result = sqlx::query(
            "UPDATE refresh_tokens SET revoked = TRUE WHERE user_id = $1 AND revoked = FALSE",
        )
        .bind(user_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, record: &RefreshTokenRecord) -> Result<(), SessionError> {
        sqlx::query(
            "INSERT INTO refresh_tokens \
             (id, user_id, email, family_id, parent_token_id, token_hash, issued_at, expires_at, revoked) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             ON CONFLICT (id) DO NOTHING",
        )
        .bind(record.id)
        .bind(&record.user_id)
        .bind(&record.email)
        .bind(record.family_id)
        .bind(record.parent_token_id)
        .bind(&record.token_hash)
        .bind(record.issued_at)
        .bind(record.expires_at)
        .bind(record.revoked)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
