//! SQL Server Stream Store
//!
//! Implements [`StreamStore`] with `tiberius`. Each operation opens its own
//! TCP connection; dropping the client rolls back any transaction left open
//! by a failed append.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use store_traits::{
    cancellable, AppendResult, CancellationToken, DeleteOutcome, NewStreamMessage, Result,
    StoreError, StreamMessage, StreamStore, StreamVersion,
};
use tiberius::{Client, Config, FromSql, Row};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{version_from_db, version_to_db};
use crate::error::mssql_error;
use crate::schema::{
    mssql_schema_batches, mssql_schema_script, quote_mssql_identifier, MSSQL_DEFAULT_SCHEMA,
};

pub(crate) type MssqlClient = Client<Compat<TcpStream>>;

const HEADER_COLUMNS: &str =
    "MessageId, StreamId, StreamVersion, Position, CreatedUtc, Type, JsonMetadata";

/// Open a client connection described by `config`.
pub(crate) async fn connect(config: &Config) -> Result<MssqlClient> {
    let tcp = TcpStream::connect(config.get_addr()).await?;
    tcp.set_nodelay(true)?;

    Client::connect(config.clone(), tcp.compat_write())
        .await
        .map_err(mssql_error)
}

fn required<'a, T: FromSql<'a>>(row: &'a Row, column: &str) -> Result<T> {
    row.try_get::<T, _>(column)
        .map_err(mssql_error)?
        .ok_or_else(|| StoreError::DatabaseError(format!("Column {} is NULL", column)))
}

/// SQL Server implementation of [`StreamStore`]
pub struct MssqlStreamStore {
    config: Config,
    schema: String,
}

impl MssqlStreamStore {
    /// `schema` must be a validated identifier.
    pub fn new(config: Config, schema: Option<&str>) -> Self {
        let schema = schema.unwrap_or(MSSQL_DEFAULT_SCHEMA).to_string();
        info!(addr = %config.get_addr(), schema = %schema, "Creating SQL Server stream store");
        Self { config, schema }
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    fn table(&self, name: &str) -> String {
        format!("{}.[{}]", quote_mssql_identifier(&self.schema), name)
    }

    fn message_from_row(row: &Row) -> Result<StreamMessage> {
        let created: NaiveDateTime = required(row, "CreatedUtc")?;

        Ok(StreamMessage {
            message_id: required::<Uuid>(row, "MessageId")?,
            stream_id: required::<&str>(row, "StreamId")?.to_string(),
            stream_version: version_from_db(required(row, "StreamVersion")?)?,
            position: required(row, "Position")?,
            created_utc: created.and_utc(),
            message_type: required::<&str>(row, "Type")?.to_string(),
            json_metadata: row
                .try_get::<&str, _>("JsonMetadata")
                .map_err(mssql_error)?
                .map(str::to_string),
            prefetched_json_data: None,
        })
    }
}

#[async_trait]
impl StreamStore for MssqlStreamStore {
    async fn read_message(
        &self,
        stream_id: &str,
        version: StreamVersion,
        cancel: &CancellationToken,
    ) -> Result<Option<StreamMessage>> {
        cancellable(cancel, async {
            let mut client = connect(&self.config).await?;

            let row = match version {
                StreamVersion::End => {
                    let sql = format!(
                        "SELECT TOP 1 {} FROM {} WHERE StreamId = @P1 ORDER BY StreamVersion DESC",
                        HEADER_COLUMNS,
                        self.table("Messages")
                    );
                    client
                        .query(sql, &[&stream_id])
                        .await
                        .map_err(mssql_error)?
                        .into_row()
                        .await
                }
                StreamVersion::Concrete(v) => {
                    let sql = format!(
                        "SELECT {} FROM {} WHERE StreamId = @P1 AND StreamVersion = @P2",
                        HEADER_COLUMNS,
                        self.table("Messages")
                    );
                    let v = version_to_db(v)?;
                    client
                        .query(sql, &[&stream_id, &v])
                        .await
                        .map_err(mssql_error)?
                        .into_row()
                        .await
                }
            }
            .map_err(mssql_error)?;

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
            let mut client = connect(&self.config).await?;
            let sql = format!(
                "SELECT JsonData FROM {} WHERE StreamId = @P1 AND StreamVersion = @P2",
                self.table("Messages")
            );
            let v = version_to_db(version)?;

            let row = client
                .query(sql, &[&stream_id, &v])
                .await
                .map_err(mssql_error)?
                .into_row()
                .await
                .map_err(mssql_error)?;

            row.as_ref()
                .map(|row| required::<&str>(row, "JsonData").map(str::to_string))
                .transpose()
        })
        .await
    }

    async fn delete_message(
        &self,
        stream_id: &str,
        version: u64,
        cancel: &CancellationToken,
    ) -> Result<DeleteOutcome> {
        cancellable(cancel, async {
            let mut client = connect(&self.config).await?;
            let sql = format!(
                "DELETE FROM {} WHERE StreamId = @P1 AND StreamVersion = @P2",
                self.table("Messages")
            );
            let v = version_to_db(version)?;

            let result = client
                .execute(sql, &[&stream_id, &v])
                .await
                .map_err(mssql_error)?;

            let outcome = if result.total() > 0 {
                DeleteOutcome::Deleted
            } else {
                DeleteOutcome::NotFound
            };
            debug!(stream_id, stream_version = version, ?outcome, "Delete completed");
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
            let mut client = connect(&self.config).await?;

            client
                .simple_query("BEGIN TRANSACTION")
                .await
                .map_err(mssql_error)?
                .into_results()
                .await
                .map_err(mssql_error)?;

            let streams = self.table("Streams");
            let head_sql = format!(
                "DECLARE @head BIGINT;
UPDATE {streams} WITH (UPDLOCK, HOLDLOCK)
    SET @head = Version = Version + @P2
    WHERE StreamId = @P1;
IF @@ROWCOUNT = 0
BEGIN
    SET @head = @P2 - 1;
    INSERT INTO {streams} (StreamId, Version) VALUES (@P1, @head);
END;
SELECT @head AS Version;",
                streams = streams
            );

            let head_row = client
                .query(head_sql, &[&stream_id, &count])
                .await
                .map_err(mssql_error)?
                .into_row()
                .await
                .map_err(mssql_error)?
                .ok_or_else(|| {
                    StoreError::DatabaseError("Stream head update returned no row".to_string())
                })?;
            let head: i64 = required(&head_row, "Version")?;

            let insert_sql = format!(
                "INSERT INTO {} (StreamId, StreamVersion, MessageId, Type, JsonData, JsonMetadata)
OUTPUT INSERTED.Position
VALUES (@P1, @P2, @P3, @P4, @P5, @P6)",
                self.table("Messages")
            );

            let first_version = head - count + 1;
            let mut position = 0i64;
            for (offset, message) in messages.iter().enumerate() {
                let stream_version = first_version + offset as i64;
                let row = client
                    .query(
                        insert_sql.as_str(),
                        &[
                            &stream_id,
                            &stream_version,
                            &message.message_id,
                            &message.message_type.as_str(),
                            &message.json_data.as_str(),
                            &message.json_metadata.as_deref(),
                        ],
                    )
                    .await
                    .map_err(mssql_error)?
                    .into_row()
                    .await
                    .map_err(mssql_error)?
                    .ok_or_else(|| {
                        StoreError::DatabaseError("Insert returned no position".to_string())
                    })?;
                position = required(&row, "Position")?;
            }

            client
                .simple_query("COMMIT TRANSACTION")
                .await
                .map_err(mssql_error)?
                .into_results()
                .await
                .map_err(mssql_error)?;

            Ok(AppendResult {
                current_version: version_from_db(head)?,
                current_position: position,
            })
        })
        .await
    }

    async fn create_schema_if_not_exists(&self, cancel: &CancellationToken) -> Result<()> {
        cancellable(cancel, async {
            info!(schema = %self.schema, "Creating SQL Server schema if not exists");
            let mut client = connect(&self.config).await?;

            for batch in mssql_schema_batches(&self.schema) {
                client
                    .simple_query(batch)
                    .await
                    .map_err(mssql_error)?
                    .into_results()
                    .await
                    .map_err(mssql_error)?;
            }
            Ok(())
        })
        .await
    }

    fn schema_creation_script(&self) -> String {
        mssql_schema_script(&self.schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(schema: Option<&str>) -> MssqlStreamStore {
        let config =
            Config::from_ado_string("Server=tcp:localhost,1433;Database=streams;User Id=sa;Password=pw")
                .unwrap();
        MssqlStreamStore::new(config, schema)
    }

    #[test]
    fn test_default_schema_is_dbo() {
        let store = store(None);
        assert_eq!(store.schema(), MSSQL_DEFAULT_SCHEMA);
        assert_eq!(store.table("Messages"), "[dbo].[Messages]");
    }

    #[test]
    fn test_script_uses_configured_schema() {
        let store = store(Some("events"));
        let script = store.schema_creation_script();
        assert!(script.contains("[events].[Streams]"));
        assert!(script.contains("\nGO\n"));
    }

    #[tokio::test]
    async fn test_cancelled_before_connecting() {
        let store = store(None);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = store.delete_message("orders-1", 0, &cancel).await;
        assert!(matches!(result, Err(StoreError::Cancelled)));
    }
}
