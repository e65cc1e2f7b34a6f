//! Input checks run before a request reaches the database.
//!
//! The schema enforces the same limits (`VARCHAR(n)`, `NOT NULL`, non-blank checks), but
//! catching them here yields a [`DbError::Validation`] naming the field instead of an opaque
//! driver error.

use crate::db::errors::{DbError, Result};

/// Require a non-blank value of at most `max` characters.
pub fn required(field: &str, value: &str, max: usize) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DbError::Validation {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    max_len(field, value, max)
}

/// Require a value of at most `max` characters.
pub fn max_len(field: &str, value: &str, max: usize) -> Result<()> {
    let len = value.chars().count();
    if len > max {
        return Err(DbError::Validation {
            field: field.to_string(),
            message: format!("must be at most {max} characters, got {len}"),
        });
    }
    Ok(())
}

/// Apply [`max_len`] when the value is present.
pub fn optional(field: &str, value: Option<&str>, max: usize) -> Result<()> {
    match value {
        Some(v) => max_len(field, v, max),
        None => Ok(()),
    }
}

/// Require a non-blank value with no length limit.
pub fn not_blank(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(DbError::Validation {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

/// Require an absolute http(s) URL.
pub fn http_url(field: &str, value: &str) -> Result<()> {
    let parsed = url::Url::parse(value).map_err(|e| DbError::Validation {
        field: field.to_string(),
        message: format!("not a valid URL: {e}"),
    })?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        scheme => Err(DbError::Validation {
            field: field.to_string(),
            message: format!("unsupported URL scheme '{scheme}'"),
        }),
    }
}

/// Reject page sizes the database would refuse or that make no sense.
pub fn page(skip: i64, limit: i64) -> Result<()> {
    if skip < 0 {
        return Err(DbError::Validation {
            field: "skip".to_string(),
            message: "must not be negative".to_string(),
        });
    }
    if limit < 1 {
        return Err(DbError::Validation {
            field: "limit".to_string(),
            message: "must be at least 1".to_string(),
        });
    }
    Ok(())
}

/// Case-insensitive substring pattern for `LIKE ... ESCAPE '\'`, with wildcards in the term
/// matched literally.
pub fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.to_lowercase().chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank_and_long_values() {
        assert!(required("username", "alice", 100).is_ok());
        assert!(matches!(required("username", "   ", 100), Err(DbError::Validation { .. })));

        let long = "x".repeat(101);
        let err = required("username", &long, 100).unwrap_err();
        assert!(err.to_string().contains("at most 100"));
    }

    #[test]
    fn test_max_len_counts_characters_not_bytes() {
        // 20 multi-byte characters fit into a VARCHAR(20)
        let version = "é".repeat(20);
        assert!(max_len("version", &version, 20).is_ok());
    }

    #[test]
    fn test_optional_skips_missing_values() {
        assert!(optional("description", None, 255).is_ok());
        assert!(optional("description", Some(&"d".repeat(256)), 255).is_err());
    }

    #[test]
    fn test_http_url() {
        assert!(http_url("jira_base_url", "https://example.atlassian.net").is_ok());
        assert!(http_url("jira_base_url", "not a url").is_err());
        assert!(http_url("jira_base_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_page_bounds() {
        assert!(page(0, 10).is_ok());
        assert!(page(-1, 10).is_err());
        assert!(page(0, 0).is_err());
    }

    #[test]
    fn test_contains_pattern_escapes_wildcards() {
        assert_eq!(contains_pattern("Billing"), "%billing%");
        assert_eq!(contains_pattern("50%"), "%50\\%%");
        assert_eq!(contains_pattern("a_b\\c"), "%a\\_b\\\\c%");
    }
}
