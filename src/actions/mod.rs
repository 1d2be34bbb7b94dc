//! Action handlers behind the HTTP endpoints.
//!
//! Each submodule implements one area of the admin surface as a handler
//! struct with typed input/output structs. Handlers receive the session
//! explicitly and open their own short-lived connection per call.

pub mod columns;
pub mod csv;
pub mod databases;
pub mod export;
pub mod import;
pub mod query;
pub mod records;
pub mod tables;

pub use columns::ColumnHandler;
pub use csv::CsvExporter;
pub use databases::DatabaseHandler;
pub use export::{DumpScope, DumpTarget, SqlDumper};
pub use import::ImportHandler;
pub use query::QueryHandler;
pub use records::RecordHandler;
pub use tables::TableHandler;
