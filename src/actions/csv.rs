//! CSV export of a SELECT result.
//!
//! Runs one user-authored SELECT with the export row ceiling applied and
//! renders the result as CSV: header row of column names, UTF-8 BOM so
//! spreadsheet tools pick the right encoding, and fixed renderings for the
//! values CSV cannot represent (NULL, booleans, binary blobs).

use crate::db;
use crate::db::{RowToJson, TypeCategory, column_categories, decode_column};
use crate::error::{AdminError, AdminResult};
use crate::models::RowLimitPolicy;
use crate::session::Session;
use crate::sql::limit::prepare_adhoc_statement;
use serde::Deserialize;
use serde_json::Value as JsonValue;
use sqlx::{Column, Executor};
use tracing::info;

/// Byte-order mark prepended so Excel and friends detect UTF-8.
pub const UTF8_BOM: &str = "\u{feff}";

/// Input for the CSV export action.
#[derive(Debug, Clone, Deserialize)]
pub struct CsvExportInput {
    #[serde(default)]
    pub database: Option<String>,
    /// SELECT statement to export. Non-SELECT statements are rejected.
    pub sql: String,
    /// Requested row ceiling; clamped to the configured export maximum.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Download filename; defaults to `export.csv`.
    #[serde(default)]
    pub filename: Option<String>,
}

/// A rendered CSV document ready to stream as a download.
#[derive(Debug, Clone)]
pub struct CsvDocument {
    pub filename: String,
    pub content: String,
}

/// Quote a field when it contains a separator, quote or line break;
/// internal quotes are doubled.
pub fn escape_csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Header row of column names, CRLF terminated. Emitted unconditionally,
/// including for empty result sets.
fn header_row(names: &[String]) -> String {
    let fields: Vec<String> = names.iter().map(|n| escape_csv_field(n)).collect();
    format!("{}\r\n", fields.join(","))
}

/// Render one cell for CSV output.
///
/// NULL becomes the literal `NULL`, booleans become `1`/`0`, binary columns
/// become the `[resource]` placeholder, and structured values fall back to
/// their JSON text or `[unserializable]`.
pub fn format_csv_cell(value: &JsonValue, category: TypeCategory) -> String {
    if value.is_null() {
        return "NULL".to_string();
    }
    if category == TypeCategory::Binary {
        return "[resource]".to_string();
    }
    match value {
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => "0".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| "[unserializable]".to_string()),
    }
}

/// Handler for the CSV export action.
#[derive(Debug, Clone, Copy)]
pub struct CsvExporter {
    limits: RowLimitPolicy,
}

impl CsvExporter {
    pub fn new(limits: RowLimitPolicy) -> Self {
        Self { limits }
    }

    /// Execute the SELECT and render its rows as a CSV document.
    pub async fn export(
        &self,
        session: &Session,
        input: CsvExportInput,
    ) -> AdminResult<CsvDocument> {
        let ceiling = self.limits.export_ceiling(input.limit);
        let prepared = prepare_adhoc_statement(&input.sql, ceiling)?;
        if !prepared.kind.is_select() {
            return Err(AdminError::invalid_input(
                "Only SELECT queries can be exported as CSV",
            ));
        }

        let mut conn = db::connect(&session.credentials, input.database.as_deref()).await?;
        let rows = db::fetch_all(&mut conn, &prepared.sql, &[])
            .await
            .map_err(|e| AdminError::execution("CSV export failed", e))?;

        let mut content = String::from(UTF8_BOM);
        if let Some(first) = rows.first() {
            let names = first.column_names();
            let categories = column_categories(first);
            content.push_str(&header_row(&names));

            for row in &rows {
                let fields: Vec<String> = categories
                    .iter()
                    .enumerate()
                    .map(|(idx, category)| {
                        let value = decode_column(row, idx, *category);
                        escape_csv_field(&format_csv_cell(&value, *category))
                    })
                    .collect();
                content.push_str(&fields.join(","));
                content.push_str("\r\n");
            }
        } else {
            // An empty result still has column metadata; the header comes
            // from describing the prepared statement instead of a row.
            let described = conn
                .describe(&prepared.sql)
                .await
                .map_err(|e| AdminError::execution("CSV export failed", e))?;
            let names: Vec<String> = described
                .columns()
                .iter()
                .map(|col| col.name().to_string())
                .collect();
            content.push_str(&header_row(&names));
        }

        info!(rows = rows.len(), "CSV export rendered");
        Ok(CsvDocument {
            filename: input
                .filename
                .filter(|f| !f.trim().is_empty())
                .unwrap_or_else(|| "export.csv".to_string()),
            content,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_escape_plain_field_untouched() {
        assert_eq!(escape_csv_field("plain"), "plain");
        assert_eq!(escape_csv_field(""), "");
    }

    #[test]
    fn test_escape_quotes_and_separators() {
        assert_eq!(escape_csv_field("a,b"), "\"a,b\"");
        assert_eq!(escape_csv_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(escape_csv_field("line1\nline2"), "\"line1\nline2\"");
    }

    #[test]
    fn test_null_renders_as_literal() {
        assert_eq!(format_csv_cell(&json!(null), TypeCategory::Text), "NULL");
        // NULL wins over the binary placeholder
        assert_eq!(format_csv_cell(&json!(null), TypeCategory::Binary), "NULL");
    }

    #[test]
    fn test_booleans_render_as_digits() {
        assert_eq!(format_csv_cell(&json!(true), TypeCategory::Boolean), "1");
        assert_eq!(format_csv_cell(&json!(false), TypeCategory::Boolean), "0");
    }

    #[test]
    fn test_binary_renders_placeholder() {
        assert_eq!(
            format_csv_cell(&json!("//4AAQ=="), TypeCategory::Binary),
            "[resource]"
        );
    }

    #[test]
    fn test_structured_values_render_as_json_text() {
        assert_eq!(
            format_csv_cell(&json!({"a": 1}), TypeCategory::Json),
            r#"{"a":1}"#
        );
        assert_eq!(format_csv_cell(&json!([1, 2]), TypeCategory::Json), "[1,2]");
    }

    #[test]
    fn test_header_row_rendered_even_without_data() {
        let names = vec!["id".to_string(), "city, state".to_string()];
        assert_eq!(header_row(&names), "id,\"city, state\"\r\n");
        assert_eq!(header_row(&[]), "\r\n");
    }

    #[test]
    fn test_input_defaults() {
        let input: CsvExportInput =
            serde_json::from_str(r#"{"sql": "SELECT * FROM t"}"#).unwrap();
        assert_eq!(input.limit, None);
        assert_eq!(input.filename, None);
    }
}
