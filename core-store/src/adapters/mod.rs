//! Storage engine implementations of [`store_traits::StreamStore`].

pub mod in_memory;
pub mod mssql;
pub mod postgres;

pub use in_memory::InMemoryStreamStore;
pub use mssql::MssqlStreamStore;
pub use postgres::PostgresStreamStore;
