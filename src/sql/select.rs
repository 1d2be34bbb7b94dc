//! Filter/sort/paginate query builder for the records listing.
//!
//! Builds the paired statements for one page of a table: a `COUNT(*)` over
//! the filtered rows and the `SELECT *` page itself. Filter values are
//! returned as a bind list, never spliced into the SQL text.

use crate::error::{AdminError, AdminResult};
use crate::models::{FilterSpec, SortDirection};
use crate::sql::escape::Ident;

/// The two statements for one records page, plus their shared bind values.
#[derive(Debug, Clone)]
pub struct RecordPageQuery {
    /// `SELECT COUNT(*) FROM t [WHERE ...]`
    pub count_sql: String,
    /// `SELECT * FROM t [WHERE ...] [ORDER BY ...] LIMIT ? OFFSET ?`
    pub select_sql: String,
    /// `%value%` wrapped filter values, in WHERE-clause order. Both
    /// statements take exactly these binds; the page statement additionally
    /// binds limit and offset.
    pub filter_binds: Vec<String>,
    pub offset: u64,
    pub limit: u64,
}

/// Build the count + page statement pair for a filtered, sorted table page.
///
/// Each non-empty filter becomes `col LIKE ?` with the value wrapped as
/// `%value%`, ANDed together. A missing or invalid sort column means
/// natural (unspecified) order.
pub fn build_record_page(
    table: &str,
    filters: &FilterSpec,
    sort_column: Option<&str>,
    direction: SortDirection,
    offset: u64,
    limit: u64,
) -> AdminResult<RecordPageQuery> {
    if limit == 0 {
        return Err(AdminError::invalid_input("Limit must be positive"));
    }
    let table = Ident::new(table)?.quoted();

    let mut conditions = Vec::new();
    let mut filter_binds = Vec::new();
    for (column, value) in filters.active() {
        let column = Ident::new(column)?.quoted();
        conditions.push(format!("{} LIKE ?", column));
        filter_binds.push(format!("%{}%", value));
    }
    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    };

    let order_clause = match sort_column.filter(|c| !c.is_empty()) {
        Some(column) => match Ident::new(column) {
            Ok(ident) => format!(" ORDER BY {} {}", ident.quoted(), direction.as_sql()),
            // Unusable sort column falls back to natural order
            Err(_) => String::new(),
        },
        None => String::new(),
    };

    Ok(RecordPageQuery {
        count_sql: format!("SELECT COUNT(*) FROM {}{}", table, where_clause),
        select_sql: format!(
            "SELECT * FROM {}{}{} LIMIT ? OFFSET ?",
            table, where_clause, order_clause
        ),
        filter_binds,
        offset,
        limit,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unfiltered_page() {
        let q = build_record_page("users", &FilterSpec::new(), None, SortDirection::Asc, 0, 25)
            .unwrap();
        assert_eq!(q.count_sql, "SELECT COUNT(*) FROM `users`");
        assert_eq!(q.select_sql, "SELECT * FROM `users` LIMIT ? OFFSET ?");
        assert!(q.filter_binds.is_empty());
    }

    #[test]
    fn test_filters_become_like_binds() {
        let filters = FilterSpec::new()
            .with_filter("name", "li")
            .with_filter("email", "example.com");
        let q = build_record_page("users", &filters, None, SortDirection::Asc, 0, 25).unwrap();

        assert_eq!(
            q.count_sql,
            "SELECT COUNT(*) FROM `users` WHERE `email` LIKE ? AND `name` LIKE ?"
        );
        assert_eq!(q.filter_binds, vec!["%example.com%", "%li%"]);
    }

    #[test]
    fn test_empty_filter_value_is_skipped() {
        let filters = FilterSpec::new()
            .with_filter("name", "li")
            .with_filter("email", "");
        let q = build_record_page("users", &filters, None, SortDirection::Asc, 0, 25).unwrap();
        assert_eq!(q.filter_binds, vec!["%li%"]);
        assert!(!q.count_sql.contains("email"));
    }

    #[test]
    fn test_sort_column_escaped_and_appended() {
        let q = build_record_page(
            "users",
            &FilterSpec::new(),
            Some("created_at"),
            SortDirection::Desc,
            50,
            25,
        )
        .unwrap();
        assert_eq!(
            q.select_sql,
            "SELECT * FROM `users` ORDER BY `created_at` DESC LIMIT ? OFFSET ?"
        );
        // The count statement never sorts
        assert!(!q.count_sql.contains("ORDER BY"));
    }

    #[test]
    fn test_invalid_sort_column_means_natural_order() {
        let q = build_record_page(
            "users",
            &FilterSpec::new(),
            Some("bad`col"),
            SortDirection::Asc,
            0,
            25,
        )
        .unwrap();
        assert!(!q.select_sql.contains("ORDER BY"));
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err =
            build_record_page("users", &FilterSpec::new(), None, SortDirection::Asc, 0, 0)
                .unwrap_err();
        assert!(matches!(err, AdminError::InvalidInput { .. }));
    }

    #[test]
    fn test_filter_column_validated_as_identifier() {
        let filters = FilterSpec::new().with_filter("na`me", "x");
        assert!(
            build_record_page("users", &filters, None, SortDirection::Asc, 0, 25).is_err()
        );
    }
}
