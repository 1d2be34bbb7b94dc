//! Identifier and literal escaping.
//!
//! The single audited boundary between untrusted names/values and SQL text.
//! Values belong in bound parameters wherever the grammar accepts a
//! placeholder; these helpers exist for the contexts that cannot be
//! parameterized: identifiers everywhere, and literal values inside DDL
//! fragments and dump output.

use crate::error::{AdminError, AdminResult};
use regex::Regex;
use std::sync::LazyLock;

/// Allow-list for names used in DDL (CREATE DATABASE, CREATE TABLE,
/// RENAME TABLE): letters, digits, underscore only.
static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_]+$").expect("name pattern is valid"));

/// A validated identifier, safe to splice into SQL text in quoted form.
///
/// Constructing one is the only way action code can get an identifier into
/// a statement, so an unescaped name cannot reach SQL text by accident.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident(String);

impl Ident {
    /// Validate a table/column/database name for use in quoted contexts.
    /// Backticks and NUL are rejected outright rather than escaped.
    pub fn new(name: impl Into<String>) -> AdminResult<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(AdminError::invalid_input("Identifier must not be empty"));
        }
        if name.contains('`') || name.contains('\0') {
            return Err(AdminError::invalid_input(format!(
                "Invalid identifier '{}': backticks and NUL are not allowed",
                name.replace('\0', "\\0")
            )));
        }
        Ok(Self(name))
    }

    /// Validate a name against the strict DDL allow-list `[A-Za-z0-9_]+`.
    pub fn strict(name: impl Into<String>) -> AdminResult<Self> {
        let name = name.into();
        if !NAME_PATTERN.is_match(&name) {
            return Err(AdminError::invalid_input(format!(
                "Invalid name '{}': only letters, digits and underscore are allowed",
                name
            )));
        }
        Ok(Self(name))
    }

    /// The backtick-quoted form for splicing into SQL.
    pub fn quoted(&self) -> String {
        format!("`{}`", self.0)
    }

    /// The raw validated name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Ident {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Backtick-quote a name after validation. Shorthand for
/// `Ident::new(name)?.quoted()`.
pub fn quote_ident(name: &str) -> AdminResult<String> {
    Ok(Ident::new(name)?.quoted())
}

/// True when the name passes the strict DDL allow-list.
pub fn is_valid_name(name: &str) -> bool {
    NAME_PATTERN.is_match(name)
}

/// Escape a string for inclusion inside a single-quoted MySQL literal.
/// Matches the driver's escaping rules: backslash, quote characters, NUL,
/// newline, carriage return and ctrl-Z are backslash-escaped.
pub fn escape_literal(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '"' => escaped.push_str("\\\""),
            '\0' => escaped.push_str("\\0"),
            '\n' => escaped.push_str("\\n"),
            '\r' => escaped.push_str("\\r"),
            '\u{1a}' => escaped.push_str("\\Z"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Quote a value as a complete single-quoted MySQL literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", escape_literal(value))
}
