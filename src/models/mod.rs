//! Data models for the admin server.
//!
//! This module re-exports all model types used throughout the application.

pub mod query;
pub mod schema;

// Re-export commonly used types
pub use query::{
    DEFAULT_SELECT_CEILING, EXPORT_BATCH_ROWS, EXPORT_CHUNK_ROWS, FilterSpec, MAX_EXPORT_CEILING,
    RowLimitPolicy, SortDirection, SqlValue,
};
pub use schema::{
    ColumnDescriptor, ForeignKeyInfo, KeyRole, TableDescriptor, TableKind,
};
