//! Administrative connection targets.
//!
//! Provisioning must not connect to the target database, which may not
//! exist yet. These functions derive, without any I/O, the connection to a
//! maintenance database on the same server plus the name of the database
//! that should exist.
//!
//! | Provider   | Administrative database |
//! |------------|-------------------------|
//! | PostgreSQL | `postgres`              |
//! | SQL Server | `master`                |

use sqlx::postgres::PgConnectOptions;
use std::fmt;
use std::str::FromStr;

use crate::error::{ProvisionError, Result};

pub const POSTGRES_ADMIN_DATABASE: &str = "postgres";
pub const MSSQL_ADMIN_DATABASE: &str = "master";

// =============================================================================
// PostgreSQL
// =============================================================================

/// Connection targets for provisioning a PostgreSQL database.
#[derive(Debug, Clone)]
pub struct PostgresTarget {
    /// Connection to the maintenance database
    pub admin: PgConnectOptions,
    /// Connection to the stream store database
    pub target: PgConnectOptions,
    /// Name of the stream store database
    pub database: String,
}

/// Derive the PostgreSQL administrative target from a connection URL.
pub fn postgres_admin_target(connection_string: &str) -> Result<PostgresTarget> {
    let target = PgConnectOptions::from_str(connection_string)
        .map_err(|e| ProvisionError::InvalidConnectionString(e.to_string()))?;

    let database = target
        .get_database()
        .map(str::to_string)
        .ok_or_else(|| {
            ProvisionError::InvalidConnectionString(
                "connection string does not name a database".to_string(),
            )
        })?;

    let admin = target.clone().database(POSTGRES_ADMIN_DATABASE);

    Ok(PostgresTarget {
        admin,
        target,
        database,
    })
}

// =============================================================================
// SQL Server
// =============================================================================

const DATABASE_KEYS: &[&str] = &["database", "initial catalog"];

/// An ADO.NET-style `key=value;` connection string.
///
/// Keys keep their original spelling and order so the string can be written
/// back unchanged apart from the edited entries. Values containing `;` are
/// not supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdoConnectionString {
    pairs: Vec<(String, String)>,
}

impl AdoConnectionString {
    /// The database (`Database` or `Initial Catalog`) named by the string.
    pub fn database(&self) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(key, _)| is_database_key(key))
            .map(|(_, value)| value.as_str())
            .filter(|value| !value.is_empty())
    }

    /// A copy pointing at `database` instead.
    pub fn with_database(&self, database: &str) -> Self {
        let mut pairs = self.pairs.clone();
        let mut replaced = false;

        for (key, value) in pairs.iter_mut() {
            if is_database_key(key) {
                *value = database.to_string();
                replaced = true;
            }
        }

        if !replaced {
            pairs.push(("Database".to_string(), database.to_string()));
        }

        Self { pairs }
    }

    /// Parse into a tiberius client configuration.
    pub fn to_config(&self) -> Result<tiberius::Config> {
        tiberius::Config::from_ado_string(&self.to_string())
            .map_err(|e| ProvisionError::InvalidConnectionString(e.to_string()))
    }
}

fn is_database_key(key: &str) -> bool {
    let key = key.to_lowercase();
    DATABASE_KEYS.contains(&key.as_str())
}

impl FromStr for AdoConnectionString {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self> {
        let mut pairs = Vec::new();

        for segment in s.split(';').map(str::trim).filter(|seg| !seg.is_empty()) {
            let (key, value) = segment.split_once('=').ok_or_else(|| {
                ProvisionError::InvalidConnectionString(format!(
                    "expected key=value, found '{}'",
                    segment
                ))
            })?;
            pairs.push((key.trim().to_string(), value.trim().to_string()));
        }

        if pairs.is_empty() {
            return Err(ProvisionError::InvalidConnectionString(
                "connection string is empty".to_string(),
            ));
        }

        Ok(Self { pairs })
    }
}

impl fmt::Display for AdoConnectionString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (key, value) in &self.pairs {
            write!(f, "{}={};", key, value)?;
        }
        Ok(())
    }
}

/// Connection targets for provisioning a SQL Server database.
#[derive(Debug, Clone)]
pub struct MssqlTarget {
    /// Connection to `master`
    pub admin: AdoConnectionString,
    /// Connection to the stream store database
    pub target: AdoConnectionString,
    /// Name of the stream store database
    pub database: String,
}

/// Derive the SQL Server administrative target from an ADO.NET connection string.
pub fn mssql_admin_target(connection_string: &str) -> Result<MssqlTarget> {
    let target: AdoConnectionString = connection_string.parse()?;

    let database = target.database().map(str::to_string).ok_or_else(|| {
        ProvisionError::InvalidConnectionString(
            "connection string does not name a database".to_string(),
        )
    })?;

    let admin = target.with_database(MSSQL_ADMIN_DATABASE);

    Ok(MssqlTarget {
        admin,
        target,
        database,
    })
}
