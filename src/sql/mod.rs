//! Dynamic SQL construction.
//!
//! The safety seam of the service: identifier/literal escaping, the
//! row-limit enforcer for ad-hoc SQL, the filter/sort/paginate builder,
//! and the DML/DDL composers. Everything here is pure string work with no
//! database access, so it is fully unit-testable.

pub mod ddl;
pub mod escape;
pub mod limit;
pub mod mutation;
pub mod select;

pub use ddl::{ColumnSpec, build_add_column, build_create_table, build_drop_column,
    build_drop_table, build_modify_column, build_rename_table};
pub use escape::{Ident, escape_literal, is_valid_name, quote_ident, quote_literal};
pub use limit::{PreparedStatement, StatementKind, enforce_select_ceiling, normalize_statement,
    prepare_adhoc_statement};
pub use mutation::{BoundStatement, build_delete, build_fetch_by_key, build_insert, build_update};
pub use select::{RecordPageQuery, build_record_page};
