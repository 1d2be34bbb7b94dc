//! Row-limit enforcement for ad-hoc SQL.
//!
//! Arbitrary user-authored SQL goes through three steps before execution:
//! normalization (single-statement check), classification (SELECT vs not),
//! and for SELECTs a LIMIT rewrite so the effective row count never exceeds
//! the configured ceiling. Detection is light token matching over the four
//! MySQL LIMIT syntaxes, deliberately not a SQL grammar.

use crate::error::{AdminError, AdminResult};
use regex::Regex;
use std::sync::LazyLock;

static LIMIT_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)\s*,\s*(\d+)").expect("valid pattern"));

static LIMIT_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bLIMIT\s+(\d+)\s+OFFSET\s+(\d+)").expect("valid pattern")
});

static LIMIT_SIMPLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bLIMIT\s+(\d+)").expect("valid pattern"));

/// Broad class of a normalized statement, decided by its leading keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Classify by the uppercased first six characters of the statement.
    pub fn classify(sql: &str) -> Self {
        let prefix: String = sql.chars().take(6).collect::<String>().to_uppercase();
        match prefix.as_str() {
            "SELECT" => Self::Select,
            "INSERT" => Self::Insert,
            "UPDATE" => Self::Update,
            "DELETE" => Self::Delete,
            _ => Self::Other,
        }
    }

    pub fn is_select(&self) -> bool {
        matches!(self, Self::Select)
    }
}

/// An ad-hoc statement that passed normalization, ready to execute.
#[derive(Debug, Clone)]
pub struct PreparedStatement {
    pub sql: String,
    pub kind: StatementKind,
}

/// Normalize raw query text: trim, strip the trailing run of semicolons and
/// whitespace, then reject empty input and anything still containing a `;`
/// (multiple statements).
pub fn normalize_statement(sql: &str) -> AdminResult<String> {
    let trimmed = sql.trim();
    if trimmed.is_empty() {
        return Err(AdminError::invalid_input("Query must not be empty"));
    }
    let stripped = trimmed.trim_end_matches(|c: char| c == ';' || c.is_whitespace());
    if stripped.is_empty() {
        return Err(AdminError::invalid_input("Query must not be empty"));
    }
    if stripped.contains(';') {
        return Err(AdminError::invalid_input(
            "Multiple statements are not allowed",
        ));
    }
    Ok(stripped.to_string())
}

/// Rewrite the first LIMIT clause of a SELECT so its row count never
/// exceeds `ceiling`; append one when no LIMIT is present.
///
/// Handles the four syntaxes:
/// - no LIMIT          -> ` LIMIT {ceiling}` appended
/// - `LIMIT a, b`      -> count capped, offset preserved
/// - `LIMIT a OFFSET b`-> count capped, offset preserved
/// - `LIMIT a`         -> count capped
///
/// Compliant clauses are left byte-for-byte unchanged.
pub fn enforce_select_ceiling(sql: &str, ceiling: u64) -> String {
    if let Some(caps) = LIMIT_COMMA.captures(sql) {
        let count: u64 = caps[2].parse().unwrap_or(u64::MAX);
        if count > ceiling {
            let replacement = format!("LIMIT {},{}", &caps[1], ceiling);
            return LIMIT_COMMA.replace(sql, replacement.as_str()).into_owned();
        }
        return sql.to_string();
    }

    if let Some(caps) = LIMIT_OFFSET.captures(sql) {
        let count: u64 = caps[1].parse().unwrap_or(u64::MAX);
        if count > ceiling {
            let replacement = format!("LIMIT {} OFFSET {}", ceiling, &caps[2]);
            return LIMIT_OFFSET.replace(sql, replacement.as_str()).into_owned();
        }
        return sql.to_string();
    }

    if let Some(caps) = LIMIT_SIMPLE.captures(sql) {
        let count: u64 = caps[1].parse().unwrap_or(u64::MAX);
        if count > ceiling {
            let replacement = format!("LIMIT {}", ceiling);
            return LIMIT_SIMPLE.replace(sql, replacement.as_str()).into_owned();
        }
        return sql.to_string();
    }

    format!("{} LIMIT {}", sql, ceiling)
}

/// Normalize, classify and (for SELECTs) limit-cap one ad-hoc statement.
pub fn prepare_adhoc_statement(sql: &str, ceiling: u64) -> AdminResult<PreparedStatement> {
    let normalized = normalize_statement(sql)?;
    let kind = StatementKind::classify(&normalized);
    let sql = if kind.is_select() {
        enforce_select_ceiling(&normalized, ceiling)
    } else {
        normalized
    };
    Ok(PreparedStatement { sql, kind })
}
