//! DDL for the database-backed stream stores.
//!
//! Every statement is idempotent so the scripts can run against an
//! initialized database without touching stored messages.

pub const POSTGRES_DEFAULT_SCHEMA: &str = "public";
pub const MSSQL_DEFAULT_SCHEMA: &str = "dbo";

/// Quote a PostgreSQL identifier (`"name"`, inner quotes doubled).
pub fn quote_pg_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Quote a SQL Server identifier (`[name]`, inner brackets doubled).
pub fn quote_mssql_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}

/// Existence check against `pg_database`; binds the database name as `$1`.
pub const POSTGRES_DATABASE_EXISTS_SQL: &str = "SELECT 1 FROM pg_database WHERE datname = $1";

/// Existence check against `sys.databases`; binds the database name as `@P1`.
pub const MSSQL_DATABASE_EXISTS_SQL: &str = "SELECT 1 AS Found FROM sys.databases WHERE name = @P1";

/// `CREATE DATABASE` for PostgreSQL with the name quoted.
pub fn postgres_create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE {}", quote_pg_identifier(database))
}

/// `CREATE DATABASE` for SQL Server with the name quoted.
pub fn mssql_create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE {}", quote_mssql_identifier(database))
}

/// PostgreSQL schema creation script for `schema`.
///
/// `schema` must already be validated as a plain identifier.
pub fn postgres_schema_script(schema: &str) -> String {
    format!(
        r#"CREATE SCHEMA IF NOT EXISTS {schema};

CREATE TABLE IF NOT EXISTS {schema}.streams (
    stream_id       TEXT        NOT NULL PRIMARY KEY,
    version         BIGINT      NOT NULL
);

CREATE TABLE IF NOT EXISTS {schema}.messages (
    position        BIGSERIAL   NOT NULL PRIMARY KEY,
    stream_id       TEXT        NOT NULL,
    stream_version  BIGINT      NOT NULL,
    message_id      UUID        NOT NULL,
    created_utc     TIMESTAMPTZ NOT NULL DEFAULT now(),
    type            TEXT        NOT NULL,
    json_data       TEXT        NOT NULL,
    json_metadata   TEXT        NULL,
    CONSTRAINT messages_stream_version_key UNIQUE (stream_id, stream_version)
);
"#,
        schema = schema
    )
}

/// SQL Server schema creation batches for `schema`, in execution order.
///
/// SQL Server needs the schema to exist before a batch referencing it is
/// compiled, so the script is split into separate batches.
pub fn mssql_schema_batches(schema: &str) -> Vec<String> {
    let quoted = quote_mssql_identifier(schema);

    vec![
        format!(
            "IF NOT EXISTS (SELECT 1 FROM sys.schemas WHERE name = N'{name}')\n\
             BEGIN\n    EXEC('CREATE SCHEMA {quoted}')\nEND;",
            name = schema,
            quoted = quoted
        ),
        format!(
            r#"IF OBJECT_ID(N'{quoted}.[Streams]', N'U') IS NULL
BEGIN
    CREATE TABLE {quoted}.[Streams] (
        StreamId        NVARCHAR(400)    NOT NULL PRIMARY KEY,
        Version         BIGINT           NOT NULL
    );
END;

IF OBJECT_ID(N'{quoted}.[Messages]', N'U') IS NULL
BEGIN
    CREATE TABLE {quoted}.[Messages] (
        Position        BIGINT IDENTITY(0,1) NOT NULL PRIMARY KEY,
        StreamId        NVARCHAR(400)    NOT NULL,
        StreamVersion   BIGINT           NOT NULL,
        MessageId       UNIQUEIDENTIFIER NOT NULL,
        CreatedUtc      DATETIME2        NOT NULL DEFAULT SYSUTCDATETIME(),
        Type            NVARCHAR(128)    NOT NULL,
        JsonData        NVARCHAR(MAX)    NOT NULL,
        JsonMetadata    NVARCHAR(MAX)    NULL,
        CONSTRAINT UQ_Messages_StreamId_StreamVersion UNIQUE (StreamId, StreamVersion)
    );
END;"#,
            quoted = quoted
        ),
    ]
}

/// SQL Server schema creation script, batches separated by `GO`.
pub fn mssql_schema_script(schema: &str) -> String {
    mssql_schema_batches(schema).join("\nGO\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_quoting() {
        assert_eq!(quote_pg_identifier("streams"), "\"streams\"");
        assert_eq!(quote_pg_identifier("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_mssql_identifier("streams"), "[streams]");
        assert_eq!(quote_mssql_identifier("we]ird"), "[we]]ird]");
    }

    #[test]
    fn test_create_database_quotes_names() {
        assert_eq!(
            postgres_create_database_sql("streams"),
            "CREATE DATABASE \"streams\""
        );
        assert_eq!(
            postgres_create_database_sql("odd\"; DROP DATABASE x; --"),
            "CREATE DATABASE \"odd\"\"; DROP DATABASE x; --\""
        );
        assert_eq!(mssql_create_database_sql("streams"), "CREATE DATABASE [streams]");
        assert_eq!(
            mssql_create_database_sql("odd]; DROP DATABASE x; --"),
            "CREATE DATABASE [odd]]; DROP DATABASE x; --]"
        );
    }

    #[test]
    fn test_database_exists_queries_bind_the_name() {
        assert!(POSTGRES_DATABASE_EXISTS_SQL.ends_with("datname = $1"));
        assert!(MSSQL_DATABASE_EXISTS_SQL.ends_with("name = @P1"));
    }

    #[test]
    fn test_postgres_script_is_idempotent_ddl() {
        let script = postgres_schema_script("events");
        assert!(script.contains("CREATE SCHEMA IF NOT EXISTS events;"));
        assert!(script.contains("CREATE TABLE IF NOT EXISTS events.messages"));
        assert!(script.contains("CREATE TABLE IF NOT EXISTS events.streams"));
        assert!(!script.contains("DROP"));
    }

    #[test]
    fn test_mssql_script_batches() {
        let batches = mssql_schema_batches("events");
        assert_eq!(batches.len(), 2);
        assert!(batches[0].contains("CREATE SCHEMA [events]"));
        assert!(batches[1].contains("[events].[Messages]"));

        let script = mssql_schema_script("events");
        assert_eq!(script.matches("\nGO\n").count(), 1);
    }
}
