//! PostgreSQL Stream Store
//!
//! Implements [`StreamStore`] on top of a `sqlx` Postgres pool.
//!
//! ## Layout
//!
//! - `{schema}.streams` holds the head version of each stream
//! - `{schema}.messages` holds one row per message, `position` is the
//!   store-wide sequence
//!
//! Header reads never select `json_data`; the payload is fetched separately
//! through [`StreamStore::read_message_data`] when a caller asks for it.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgPool, PgRow};
use sqlx::Row;
use store_traits::{
    cancellable, AppendResult, CancellationToken, DeleteOutcome, NewStreamMessage, Result,
    StoreError, StreamMessage, StreamStore, StreamVersion,
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db::{version_from_db, version_to_db, DatabaseConfig};
use crate::error::sqlx_error;
use crate::schema::{postgres_schema_script, POSTGRES_DEFAULT_SCHEMA};

const HEADER_COLUMNS: &str =
    "message_id, stream_id, stream_version, position, created_utc, type, json_metadata";

/// PostgreSQL implementation of [`StreamStore`]
pub struct PostgresStreamStore {
    pool: PgPool,
    schema: String,
}

impl PostgresStreamStore {
    /// Wrap an existing pool. `schema` must be a validated identifier.
    pub fn new(pool: PgPool, schema: Option<&str>) -> Self {
        Self {
            pool,
            schema: schema.unwrap_or(POSTGRES_DEFAULT_SCHEMA).to_string(),
        }
    }

    /// Build a store whose pool opens connections on first use.
    ///
    /// Nothing is dialed here, so the store can be constructed before its
    /// database has been created.
    pub fn connect_lazy(
        options: PgConnectOptions,
        config: &DatabaseConfig,
        schema: Option<&str>,
    ) -> Self {
        info!(
            host = options.get_host(),
            database = options.get_database().unwrap_or_default(),
            max_connections = config.max_connections,
            "Creating PostgreSQL stream store"
        );

        let pool = config.pg_pool_options().connect_lazy_with(options);
        Self::new(pool, schema)
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn message_from_row(row: &PgRow) -> Result<StreamMessage> {
        Ok(StreamMessage {
            message_id: row.try_get::<Uuid, _>("message_id").map_err(sqlx_error)?,
            stream_id: row.try_get("stream_id").map_err(sqlx_error)?,
            stream_version: version_from_db(row.try_get("stream_version").map_err(sqlx_error)?)?,
            position: row.try_get("position").map_err(sqlx_error)?,
            created_utc: row
                .try_get::<DateTime<Utc>, _>("created_utc")
                .map_err(sqlx_error)?,
            message_type: row.try_get("type").map_err(sqlx_error)?,
            json_metadata: row.try_get("json_metadata").map_err(sqlx_error)?,
            prefetched_json_data: None,
        })
    }
}

#[async_trait]
impl StreamStore for PostgresStreamStore {
    #[instrument(skip(self, cancel), fields(schema = %self.schema))]
    async fn read_message(
        &self,
        stream_id: &str,
        version: StreamVersion,
        cancel: &CancellationToken,
    ) -> Result<Option<StreamMessage>> {
        cancellable(cancel, async {
            let row = match version {
                StreamVersion::End => {
                    let sql = format!(
                        "SELECT {} FROM {}.messages WHERE stream_id = $1 \
                         ORDER BY stream_version DESC LIMIT 1",
                        HEADER_COLUMNS, self.schema
                    );
                    sqlx::query(&sql)
                        .bind(stream_id)
                        .fetch_optional(&self.pool)
                        .await
                }
                StreamVersion::Concrete(v) => {
                    let sql = format!(
                        "SELECT {} FROM {}.messages WHERE stream_id = $1 AND stream_version = $2",
                        HEADER_COLUMNS, self.schema
                    );
                    sqlx::query(&sql)
                        .bind(stream_id)
                        .bind(version_to_db(v)?)
                        .fetch_optional(&self.pool)
                        .await
                }
            }
            .map_err(sqlx_error)?;

            row.as_ref().map(Self::message_from_row).transpose()
        })
        .await
    }

    async fn read_message_data(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<Option<String>> {
        cancellable(cancel, async {
            let sql = format!(
                "SELECT json_data FROM {}.messages WHERE stream_id = $1 AND stream_version = $2",
                self.schema
            );

            sqlx::query_scalar::<_, String>(&sql)
                .bind(stream_id)
                .bind(version_to_db(version)?)
                .fetch_optional(&self.pool)
                .await
                .map_err(sqlx_error)
        })
        .await
    }

    #[instrument(skip(self, cancel), fields(schema = %self.schema))]
    async fn delete_message(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome> {
        cancellable(cancel, async {
            let sql = format!(
                "DELETE FROM {}.messages WHERE stream_id = $1 AND stream_version = $2",
                self.schema
            );

            let result = sqlx::query(&sql)
                .bind(stream_id)
                .bind(version_to_db(version)?)
                .execute(&self.pool)
                .await
                .map_err(sqlx_error)?;

            let outcome = if result.rows_affected() > 0 {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::NotFound
            };
            debug!(?outcome, "Delete completed");
            Ok(outcome)
        })
        .await
    }

    async fn append_to_stream(
        &self,
        stream_id: &str,
        messages: Vec<NewStreamMessage>,
        cancel: &CancellationToken,
    ) -> Result<AppendResult> {
        if messages.is_empty() {
            return Err(StoreError::OperationFailed(
                "Cannot append an empty batch".to_string(),
            ));
        }

        cancellable(cancel, async {
            let count = messages.len() as i64;
            let mut tx = self.pool.begin().await.map_err(sqlx_error)?;

            // Row lock on the stream head serializes concurrent appends.
            let head_sql = format!(
                "INSERT INTO {schema}.streams (stream_id, version) VALUES ($1, $2 - 1) \
                 ON CONFLICT (stream_id) DO UPDATE SET version = {schema}.streams.version + $2 \
                 RETURNING version",
                schema = self.schema
            );
            let head: i64 = sqlx::query_scalar(&head_sql)
                .bind(stream_id)
                .bind(count)
                .fetch_one(&mut *tx)
                .await
                .map_err(sqlx_error)?;

            let insert_sql = format!(
                "INSERT INTO {}.messages \
                 (stream_id, stream_version, message_id, type, json_data, json_metadata) \
                 VALUES ($1, $2, $3, $4, $5, $6) RETURNING position",
                self.schema
            );

            let first_version = head - count + 1;
            let mut position = 0i64;
            for (offset, message) in messages.into_iter().enumerate() {
                position = sqlx::query_scalar(&insert_sql)
                    .bind(stream_id)
                    .bind(first_version + offset as i64)
                    .bind(message.message_id)
                    .bind(message.message_type)
                    .bind(message.json_data)
                    .bind(message.json_metadata)
                    .fetch_one(&mut *tx)
                    .await
                    .map_err(sqlx_error)?;
            }

            tx.commit().await.map_err(sqlx_error)?;

            Ok(AppendResult {
                current_version: version_from_db(head)?,
                current_position: position,
            })
        })
        .await
    }

    async fn create_schema_if_not_exists(&self, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, async {
            info!(schema = %self.schema, "Creating PostgreSQL schema if not exists");
            sqlx::raw_sql(&self.schema_creation_script())
                .execute(&self.pool)
                .await
                .map_err(sqlx_error)?;
            Ok(())
        })
        .await
    }

    fn schema_creation_script(&self) -> String {
        postgres_schema_script(&self.schema)
    }
}
