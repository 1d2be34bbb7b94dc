//! Schema-reflection data models.
//!
//! These types are built fresh on every schema-info request from live MySQL
//! metadata (`SHOW FULL TABLES`, `SHOW COLUMNS`, information_schema). They
//! are never cached; each one lives only until its response is serialized.

use serde::{Deserialize, Serialize};

/// Role a column plays in its table's keys, from `SHOW COLUMNS` `Key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    #[default]
    None,
    Primary,
    Unique,
    /// Non-unique index, or a non-leading column of a composite key (`MUL`).
    Multi,
}

impl KeyRole {
    /// Parse the `Key` column of `SHOW COLUMNS` output.
    pub fn parse(s: &str) -> Self {
        match s.to_uppercase().as_str() {
            "PRI" => Self::Primary,
            "UNI" => Self::Unique,
            "MUL" => Self::Multi,
            _ => Self::None,
        }
    }
}

/// Foreign-key metadata for one column, from information_schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForeignKeyInfo {
    pub referenced_table: String,
    pub referenced_column: String,
    pub update_rule: String,
    pub delete_rule: String,
    pub constraint_name: String,
}

/// One column of a user table, reflected from live metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    pub name: String,
    /// Raw type as MySQL reports it, e.g. `varchar(255)` or `int unsigned`.
    pub declared_type: String,
    /// Lowercased type keyword extracted from declared_type, e.g. `varchar`.
    pub base_type: String,
    /// Extracted parenthetical, e.g. `255` for `varchar(255)`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub length: Option<String>,
    pub nullable: bool,
    pub key_role: KeyRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    /// Raw extra attributes, e.g. `auto_increment`.
    pub extra: String,
    /// Ordered member list, only populated when base_type is enum or set.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub enum_values: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_key: Option<ForeignKeyInfo>,
}

impl ColumnDescriptor {
    /// Create a descriptor from a raw declared type, deriving base_type,
    /// length and enum/set members from the type text.
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        let declared_type = declared_type.into();
        let (base_type, length) = split_declared_type(&declared_type);
        let enum_values = if base_type == "enum" || base_type == "set" {
            parse_enum_members(&declared_type)
        } else {
            Vec::new()
        };
        Self {
            name: name.into(),
            base_type,
            length,
            declared_type,
            nullable: true,
            key_role: KeyRole::None,
            default_value: None,
            extra: String::new(),
            enum_values,
            foreign_key: None,
        }
    }

    /// Set nullability.
    pub fn with_nullable(mut self, nullable: bool) -> Self {
        self.nullable = nullable;
        self
    }

    /// Set the key role.
    pub fn with_key_role(mut self, key_role: KeyRole) -> Self {
        self.key_role = key_role;
        self
    }

    /// Set the default value.
    pub fn with_default(mut self, default_value: impl Into<String>) -> Self {
        self.default_value = Some(default_value.into());
        self
    }

    /// Set the extra attributes (e.g. `auto_increment`).
    pub fn with_extra(mut self, extra: impl Into<String>) -> Self {
        self.extra = extra.into();
        self
    }

    /// Attach foreign-key metadata.
    pub fn with_foreign_key(mut self, fk: ForeignKeyInfo) -> Self {
        self.foreign_key = Some(fk);
        self
    }

    /// Whether this column is the (or part of the) primary key.
    pub fn is_primary(&self) -> bool {
        self.key_role == KeyRole::Primary
    }
}

/// Split `varchar(255)` into (`varchar`, Some("255")); types without a
/// parenthetical yield (keyword, None). The keyword is the first word,
/// lowercased, so `int unsigned` gives `int`.
fn split_declared_type(declared: &str) -> (String, Option<String>) {
    let trimmed = declared.trim();
    match trimmed.find('(') {
        Some(open) => {
            let base = trimmed[..open].trim().to_lowercase();
            let length = trimmed[open + 1..]
                .find(')')
                .map(|close| trimmed[open + 1..open + 1 + close].to_string());
            (base, length)
        }
        None => {
            let base = trimmed
                .split_whitespace()
                .next()
                .unwrap_or(trimmed)
                .to_lowercase();
            (base, None)
        }
    }
}

/// Extract the quoted members of `enum('a','b')` / `set('x','y')` in order.
fn parse_enum_members(declared: &str) -> Vec<String> {
    let Some(open) = declared.find('(') else {
        return Vec::new();
    };
    let Some(close) = declared.rfind(')') else {
        return Vec::new();
    };
    if close <= open {
        return Vec::new();
    }
    declared[open + 1..close]
        .split(',')
        .map(|member| {
            member
                .trim()
                .trim_matches('\'')
                .replace("''", "'")
        })
        .filter(|member| !member.is_empty())
        .collect()
}

/// Kind of table object, from `SHOW FULL TABLES` `Table_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TableKind {
    BaseTable,
    View,
}

impl TableKind {
    /// Parse the `Table_type` column of `SHOW FULL TABLES`.
    pub fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("VIEW") {
            Self::View
        } else {
            Self::BaseTable
        }
    }

    pub fn is_view(&self) -> bool {
        matches!(self, Self::View)
    }
}

impl std::fmt::Display for TableKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BaseTable => write!(f, "BASE TABLE"),
            Self::View => write!(f, "VIEW"),
        }
    }
}

/// One table or view of a database, with its reflected columns.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableDescriptor {
    pub name: String,
    pub kind: TableKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub columns: Vec<ColumnDescriptor>,
    /// Always None for views, even when the reflection query returns
    /// key-like metadata for them.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key_column: Option<String>,
}

impl TableDescriptor {
    /// Create a new descriptor.
    pub fn new(name: impl Into<String>, kind: TableKind) -> Self {
        Self {
            name: name.into(),
            kind,
            size_bytes: None,
            columns: Vec::new(),
            primary_key_column: None,
        }
    }

    /// Set the storage size in bytes (data + indexes).
    pub fn with_size_bytes(mut self, size_bytes: u64) -> Self {
        self.size_bytes = Some(size_bytes);
        self
    }

    /// Attach reflected columns and derive the primary-key column.
    /// Views never report a primary key.
    pub fn with_columns(mut self, columns: Vec<ColumnDescriptor>) -> Self {
        if !self.kind.is_view() {
            self.primary_key_column = columns
                .iter()
                .find(|c| c.is_primary())
                .map(|c| c.name.clone());
        }
        self.columns = columns;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_role_parsing() {
        assert_eq!(KeyRole::parse("PRI"), KeyRole::Primary);
        assert_eq!(KeyRole::parse("UNI"), KeyRole::Unique);
        assert_eq!(KeyRole::parse("MUL"), KeyRole::Multi);
        assert_eq!(KeyRole::parse(""), KeyRole::None);
    }

    #[test]
    fn test_column_descriptor_splits_declared_type() {
        let col = ColumnDescriptor::new("name", "varchar(255)");
        assert_eq!(col.base_type, "varchar");
        assert_eq!(col.length, Some("255".to_string()));

        let col = ColumnDescriptor::new("n", "int unsigned");
        assert_eq!(col.base_type, "int");
        assert_eq!(col.length, None);

        let col = ColumnDescriptor::new("body", "text");
        assert_eq!(col.base_type, "text");
        assert_eq!(col.length, None);
    }

    #[test]
    fn test_column_descriptor_enum_members() {
        let col = ColumnDescriptor::new("state", "enum('new','open','closed')");
        assert_eq!(col.base_type, "enum");
        assert_eq!(col.enum_values, vec!["new", "open", "closed"]);

        let col = ColumnDescriptor::new("flags", "set('a','b')");
        assert_eq!(col.enum_values, vec!["a", "b"]);

        // Non-enum types never populate members
        let col = ColumnDescriptor::new("len", "decimal(10,2)");
        assert!(col.enum_values.is_empty());
    }

    #[test]
    fn test_table_kind_parsing() {
        assert_eq!(TableKind::parse("BASE TABLE"), TableKind::BaseTable);
        assert_eq!(TableKind::parse("VIEW"), TableKind::View);
        assert_eq!(TableKind::parse("view"), TableKind::View);
    }

    #[test]
    fn test_table_descriptor_derives_primary_key() {
        let table = TableDescriptor::new("users", TableKind::BaseTable).with_columns(vec![
            ColumnDescriptor::new("id", "int").with_key_role(KeyRole::Primary),
            ColumnDescriptor::new("name", "varchar(50)"),
        ]);
        assert_eq!(table.primary_key_column, Some("id".to_string()));
    }

    #[test]
    fn test_view_never_reports_primary_key() {
        let view = TableDescriptor::new("v_users", TableKind::View).with_columns(vec![
            ColumnDescriptor::new("id", "int").with_key_role(KeyRole::Primary),
        ]);
        assert_eq!(view.primary_key_column, None);
    }

    #[test]
    fn test_descriptor_serialization_skips_empty_fields() {
        let table = TableDescriptor::new("users", TableKind::BaseTable);
        let json = serde_json::to_string(&table).unwrap();
        assert!(!json.contains("size_bytes"));
        assert!(!json.contains("columns"));
        assert!(!json.contains("primary_key_column"));
    }
}
