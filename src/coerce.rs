//! Lenient field coercion. A value that cannot be read as its target type
//! becomes `None` (stored as SQL null) instead of failing the record.

use std::str::FromStr;

use sqlx::postgres::PgRow;
use sqlx::{Postgres, Row};

/// Parse an optional raw string into `T`, defaulting to `None` on failure.
/// Empty and whitespace-only values count as missing.
pub fn safe_cast<T: FromStr>(raw: Option<&str>) -> Option<T> {
    let value = raw?.trim();
    if value.is_empty() {
        return None;
    }
    value.parse().ok()
}

/// Decode one nullable column, defaulting to `None` when the column is
/// absent, null, or holds a value the target type cannot represent.
pub fn safe_get<'r, T>(row: &'r PgRow, column: &str) -> Option<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get::<Option<T>, _>(column).unwrap_or(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_numeric_strings() {
        assert_eq!(safe_cast::<f64>(Some("28.5")), Some(28.5));
        assert_eq!(safe_cast::<i64>(Some("42")), Some(42));
        assert_eq!(safe_cast::<f64>(Some("  1013.2 ")), Some(1013.2));
    }

    #[test]
    fn unparseable_values_become_none() {
        assert_eq!(safe_cast::<f64>(Some("n/a")), None);
        assert_eq!(safe_cast::<i64>(Some("12.7")), None);
        assert_eq!(safe_cast::<f64>(Some("28,5")), None);
    }

    #[test]
    fn missing_and_blank_values_become_none() {
        assert_eq!(safe_cast::<f64>(None), None);
        assert_eq!(safe_cast::<f64>(Some("")), None);
        assert_eq!(safe_cast::<f64>(Some("   ")), None);
    }
}
