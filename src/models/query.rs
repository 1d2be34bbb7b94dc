//! Query-related data models.
//!
//! Filter/sort specifications for the records endpoints, the bind-value
//! enum shared by the DML builders, and the row-limit policy.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;

/// Row ceiling for interactive ad-hoc SELECT execution.
pub const DEFAULT_SELECT_CEILING: u64 = 100;

/// Hard upper bound for the CSV-export row ceiling; caller-supplied values
/// are clamped to this.
pub const MAX_EXPORT_CEILING: u64 = 5000;

/// Rows fetched from the driver per page while dumping a table.
pub const EXPORT_CHUNK_ROWS: u64 = 5000;

/// Rows grouped into one multi-value INSERT statement in dump output.
pub const EXPORT_BATCH_ROWS: usize = 100;

/// Row ceilings applied by the ad-hoc query and CSV-export paths.
/// Enforced by rewriting the statement's LIMIT clause, never by truncating
/// the materialized result.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RowLimitPolicy {
    pub max_select_rows: u64,
    pub max_export_rows: u64,
}

impl Default for RowLimitPolicy {
    fn default() -> Self {
        Self {
            max_select_rows: DEFAULT_SELECT_CEILING,
            max_export_rows: MAX_EXPORT_CEILING,
        }
    }
}

impl RowLimitPolicy {
    /// Clamp a caller-supplied export ceiling to the configured maximum.
    pub fn export_ceiling(&self, requested: Option<u64>) -> u64 {
        requested
            .unwrap_or(self.max_export_rows)
            .min(self.max_export_rows)
    }
}

/// Column -> raw substring filter map for the records listing.
///
/// An empty-string value means "no filter for this column" (the filter is
/// skipped, it does not match empty strings). Keys are identifier-escaped
/// before use; values are always bound as parameters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSpec {
    filters: BTreeMap<String, String>,
}

impl FilterSpec {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter for a column.
    pub fn with_filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    /// Iterate the filters that actually apply (non-empty values),
    /// in deterministic column order.
    pub fn active(&self) -> impl Iterator<Item = (&str, &str)> {
        self.filters
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// True when no filter applies (all values empty or map empty).
    pub fn is_inactive(&self) -> bool {
        self.active().next().is_none()
    }
}

/// Sort direction for the records listing. Invalid input falls back to ASC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    /// Case-insensitive parse; anything that is not DESC sorts ascending.
    pub fn parse(s: &str) -> Self {
        if s.trim().eq_ignore_ascii_case("DESC") {
            Self::Desc
        } else {
            Self::Asc
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

/// A value bound to a statement placeholder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Binary data (base64 encoded in JSON)
    #[serde(with = "base64_bytes")]
    Bytes(Vec<u8>),
}

impl SqlValue {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Convert a JSON cell from a request's data map into a bind value.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(*b),
            JsonValue::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(0.0))
                }
            }
            JsonValue::String(s) => Self::String(s.clone()),
            // Structured values are stored as their JSON text
            other => Self::String(other.to_string()),
        }
    }
}

/// Custom serialization for binary data as base64.
mod base64_bytes {
    use base64::{Engine as _, engine::general_purpose::STANDARD};
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(bytes: &Vec<u8>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        STANDARD.encode(bytes).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<u8>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        STANDARD.decode(&s).map_err(serde::de::Error::custom)
    }
}
