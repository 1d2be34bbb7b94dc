//! DDL statement composition.
//!
//! MySQL DDL does not accept placeholders, so these statements are built by
//! validated string composition: names go through the strict allow-list or
//! backtick quoting, default values through literal escaping, and raw
//! fragments are checked for statement separators before splicing.

use crate::error::{AdminError, AdminResult};
use crate::sql::escape::{Ident, quote_literal};
use serde::Deserialize;

/// Structured input for one column definition, as submitted by the column
/// editor.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    /// Raw type text, e.g. `VARCHAR(255)` or `DECIMAL(10,2)`.
    #[serde(rename = "type")]
    pub column_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default)]
    pub primary_key: bool,
    /// Raw trailing attributes, e.g. `ON UPDATE CURRENT_TIMESTAMP`.
    #[serde(default)]
    pub extra: Option<String>,
    /// `first`, `end` (default), or `after_<columnName>`.
    #[serde(default)]
    pub position: Option<String>,
}

fn default_true() -> bool {
    true
}

/// Default values that are spliced as-is rather than quoted.
fn is_keyword_default(value: &str) -> bool {
    let upper = value.trim().to_uppercase();
    upper == "NULL" || upper == "CURRENT_TIMESTAMP" || upper == "CURRENT_TIMESTAMP()"
}

/// Reject raw fragments that could smuggle in a second statement.
fn check_fragment(fragment: &str, what: &str) -> AdminResult<()> {
    if fragment.contains(';') {
        return Err(AdminError::invalid_input(format!(
            "{} must not contain ';'",
            what
        )));
    }
    Ok(())
}

/// Compose the definition part of a column:
/// `type [NOT NULL] [DEFAULT v] [AUTO_INCREMENT] [UNIQUE] [PRIMARY KEY] [extra]`.
pub fn compose_column_definition(spec: &ColumnSpec) -> AdminResult<String> {
    let type_text = spec.column_type.trim();
    if type_text.is_empty() {
        return Err(AdminError::invalid_input("Column type must not be empty"));
    }
    check_fragment(type_text, "Column type")?;

    let mut parts = vec![type_text.to_string()];
    if !spec.nullable {
        parts.push("NOT NULL".to_string());
    }
    if let Some(default) = &spec.default_value {
        if is_keyword_default(default) {
            parts.push(format!("DEFAULT {}", default.trim().to_uppercase()));
        } else {
            parts.push(format!("DEFAULT {}", quote_literal(default)));
        }
    }
    if spec.auto_increment {
        parts.push("AUTO_INCREMENT".to_string());
    }
    if spec.unique {
        parts.push("UNIQUE".to_string());
    }
    if spec.primary_key {
        parts.push("PRIMARY KEY".to_string());
    }
    if let Some(extra) = spec.extra.as_deref().map(str::trim).filter(|e| !e.is_empty()) {
        check_fragment(extra, "Column extra")?;
        parts.push(extra.to_string());
    }
    Ok(parts.join(" "))
}

/// Translate the editor's position field into a placement clause:
/// `first` -> ` FIRST`, `end` -> append (empty), `after_<col>` -> ` AFTER `col``.
pub fn compose_position_clause(position: Option<&str>) -> AdminResult<String> {
    let Some(position) = position.map(str::trim).filter(|p| !p.is_empty()) else {
        return Ok(String::new());
    };
    if position.eq_ignore_ascii_case("end") {
        return Ok(String::new());
    }
    if position.eq_ignore_ascii_case("first") {
        return Ok(" FIRST".to_string());
    }
    if let Some(column) = position.strip_prefix("after_") {
        return Ok(format!(" AFTER {}", Ident::new(column)?.quoted()));
    }
    Err(AdminError::invalid_input(format!(
        "Invalid column position '{}': expected 'first', 'end' or 'after_<column>'",
        position
    )))
}

/// `ALTER TABLE t ADD COLUMN name <definition> [placement]`.
pub fn build_add_column(table: &str, spec: &ColumnSpec) -> AdminResult<String> {
    let table = Ident::new(table)?.quoted();
    let name = Ident::new(spec.name.as_str())?.quoted();
    let definition = compose_column_definition(spec)?;
    let placement = compose_position_clause(spec.position.as_deref())?;
    Ok(format!(
        "ALTER TABLE {} ADD COLUMN {} {}{}",
        table, name, definition, placement
    ))
}

/// `ALTER TABLE t MODIFY COLUMN old <definition>`, plus a second
/// `RENAME COLUMN` statement when the new name differs.
///
/// The pair is NOT atomic: a failure on the rename leaves the column
/// retyped but not renamed, and surfaces as a distinct error from the
/// modify step.
pub fn build_modify_column(table: &str, old_name: &str, spec: &ColumnSpec) -> AdminResult<Vec<String>> {
    let table = Ident::new(table)?.quoted();
    let old = Ident::new(old_name)?.quoted();
    let definition = compose_column_definition(spec)?;
    let placement = compose_position_clause(spec.position.as_deref())?;

    let mut statements = vec![format!(
        "ALTER TABLE {} MODIFY COLUMN {} {}{}",
        table, old, definition, placement
    )];
    if spec.name != old_name {
        let new = Ident::new(spec.name.as_str())?.quoted();
        statements.push(format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            table, old, new
        ));
    }
    Ok(statements)
}

/// `ALTER TABLE t DROP COLUMN c`.
pub fn build_drop_column(table: &str, column: &str) -> AdminResult<String> {
    Ok(format!(
        "ALTER TABLE {} DROP COLUMN {}",
        Ident::new(table)?.quoted(),
        Ident::new(column)?.quoted()
    ))
}

/// `CREATE TABLE t (frag, frag, ...) ENGINE=engine` from a raw
/// column-definition block.
///
/// The block is one fragment per column: newline-separated when it contains
/// newlines, comma-separated otherwise (so single-line input still works,
/// at the cost of not accepting commas inside a one-line type like
/// `DECIMAL(10,2)` - multi-column input should be newline-separated).
pub fn build_create_table(table: &str, definition_block: &str, engine: &str) -> AdminResult<String> {
    let table = Ident::strict(table)?;
    let engine = Ident::strict(engine)?;

    let fragments: Vec<String> = if definition_block.contains('\n') {
        definition_block.lines().map(str::trim).filter(|f| !f.is_empty())
            .map(|f| f.trim_end_matches(',').trim_end().to_string())
            .collect()
    } else {
        definition_block.split(',').map(str::trim).filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect()
    };
    if fragments.is_empty() {
        return Err(AdminError::invalid_input(
            "Table definition must contain at least one column",
        ));
    }
    for fragment in &fragments {
        check_fragment(fragment, "Column definition")?;
    }

    Ok(format!(
        "CREATE TABLE {} ({}) ENGINE={}",
        table.quoted(),
        fragments.join(", "),
        engine
    ))
}

/// `DROP TABLE t`.
pub fn build_drop_table(table: &str) -> AdminResult<String> {
    Ok(format!("DROP TABLE {}", Ident::new(table)?.quoted()))
}

/// `RENAME TABLE old TO new`. Both names go through the strict allow-list;
/// the caller additionally checks the destination against existing tables
/// and views.
pub fn build_rename_table(old_name: &str, new_name: &str) -> AdminResult<String> {
    Ok(format!(
        "RENAME TABLE {} TO {}",
        Ident::strict(old_name)?.quoted(),
        Ident::strict(new_name)?.quoted()
    ))
}
