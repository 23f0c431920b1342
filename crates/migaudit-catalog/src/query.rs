//! SQL text helpers and result decoding shared by the adapters
//!
//! The Snowflake REST API has no bind parameters, so identifiers and
//! literals are escaped here. Result cells come back as text and are
//! decoded into the audit model types.

use chrono::NaiveDate;
use migaudit_core::{ColumnDescriptor, DateCount, FetchError, RowSet};

/// Double-quote an identifier, doubling embedded quotes
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Single-quote a string literal, doubling embedded quotes
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Days to subtract from the current date for the start of a trailing window
pub fn window_offset(days: u32) -> u32 {
    days.max(1) - 1
}

/// Parse a count cell
pub fn parse_count(cell: Option<&str>) -> Result<u64, FetchError> {
    let text = cell.ok_or_else(|| FetchError::InvalidResponse("count is NULL".to_string()))?;
    let text = text.trim();

    // NUMBER columns may arrive with a fractional part of zeros
    let integral = match text.split_once('.') {
        Some((whole, frac)) if frac.chars().all(|c| c == '0') => whole,
        _ => text,
    };

    integral
        .parse::<u64>()
        .map_err(|_| FetchError::InvalidResponse(format!("'{}' is not a row count", text)))
}

/// Parse a date cell, accepting a timestamp and keeping its date part
pub fn parse_date(cell: Option<&str>) -> Result<NaiveDate, FetchError> {
    let text = cell.ok_or_else(|| FetchError::InvalidResponse("date is NULL".to_string()))?;
    let text = text.trim();
    let day = text.get(..10).unwrap_or(text);

    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|_| FetchError::InvalidResponse(format!("'{}' is not a date", text)))
}

/// Read the single count of a `SELECT COUNT(*)` result
pub fn single_count(rows: &RowSet) -> Result<u64, FetchError> {
    let row = rows
        .rows
        .first()
        .ok_or_else(|| FetchError::InvalidResponse("count query returned no rows".to_string()))?;

    parse_count(row.first().and_then(|c| c.as_deref()))
}

/// Decode `(date, count)` rows, newest first
pub fn date_counts(rows: &RowSet) -> Result<Vec<DateCount>, FetchError> {
    let mut counts = rows
        .rows
        .iter()
        .map(|row| {
            let date = parse_date(row.first().and_then(|c| c.as_deref()))?;
            let count = parse_count(row.get(1).and_then(|c| c.as_deref()))?;
            Ok(DateCount::new(date, count))
        })
        .collect::<Result<Vec<_>, FetchError>>()?;

    counts.sort_by(|a, b| b.date.cmp(&a.date));
    Ok(counts)
}

/// Decode `(column_name, data_type)` rows, keeping their order
pub fn column_list(rows: &RowSet) -> Result<Vec<ColumnDescriptor>, FetchError> {
    rows.rows
        .iter()
        .map(|row| {
            let name = row
                .first()
                .and_then(|c| c.clone())
                .ok_or_else(|| FetchError::InvalidResponse("column name is NULL".to_string()))?;
            let data_type = row.get(1).and_then(|c| c.clone()).unwrap_or_default();
            Ok(ColumnDescriptor::new(name, data_type))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn rows(cells: &[&[Option<&str>]]) -> RowSet {
        RowSet::new(
            vec!["a".to_string(), "b".to_string()],
            cells
                .iter()
                .map(|r| r.iter().map(|c| c.map(str::to_string)).collect())
                .collect(),
        )
    }

    #[test]
    fn quoting_escapes_embedded_quotes() {
        assert_eq!(quote_ident("ORDERS"), "\"ORDERS\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
        assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
    }

    #[test]
    fn window_offset_never_underflows() {
        assert_eq!(window_offset(5), 4);
        assert_eq!(window_offset(1), 0);
        assert_eq!(window_offset(0), 0);
    }

    #[test]
    fn counts_accept_number_formatting() {
        assert_eq!(parse_count(Some("42")).unwrap(), 42);
        assert_eq!(parse_count(Some(" 7.000 ")).unwrap(), 7);
        assert!(parse_count(Some("7.5")).is_err());
        assert!(parse_count(Some("-1")).is_err());
        assert!(parse_count(None).is_err());
    }

    #[test]
    fn dates_accept_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2024, 9, 30).unwrap();
        assert_eq!(parse_date(Some("2024-09-30")).unwrap(), expected);
        assert_eq!(parse_date(Some("2024-09-30 12:00:00")).unwrap(), expected);
        assert!(parse_date(Some("yesterday")).is_err());
    }

    #[test]
    fn single_count_needs_a_row() {
        assert_eq!(single_count(&rows(&[&[Some("12")]])).unwrap(), 12);
        assert!(matches!(
            single_count(&RowSet::default()),
            Err(FetchError::InvalidResponse(_))
        ));
    }

    #[test]
    fn date_counts_are_sorted_newest_first() {
        let decoded = date_counts(&rows(&[
            &[Some("2024-10-01"), Some("3")],
            &[Some("2024-10-03"), Some("5")],
            &[Some("2024-10-02"), Some("4")],
        ]))
        .unwrap();

        let dates: Vec<String> = decoded.iter().map(|d| d.date.to_string()).collect();
        assert_eq!(dates, vec!["2024-10-03", "2024-10-02", "2024-10-01"]);
        assert_eq!(decoded[0].count, 5);
    }

    #[test]
    fn column_list_keeps_order() {
        let decoded = column_list(&rows(&[
            &[Some("ID"), Some("NUMBER")],
            &[Some("NAME"), Some("TEXT")],
        ]))
        .unwrap();

        assert_eq!(
            decoded,
            vec![
                ColumnDescriptor::new("ID", "NUMBER"),
                ColumnDescriptor::new("NAME", "TEXT"),
            ]
        );
    }
}
