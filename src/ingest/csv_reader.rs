//! CSV Parsing
//!
//! Delimiter-sniffing CSV reader. The sniffer scores candidate delimiters by
//! field count on the header line; parsing goes through the `csv` crate in
//! flexible mode, with a naive line-splitting fallback for input the strict
//! reader rejects. Cells are kept as trimmed strings; downstream profiling
//! owns all numeric and date interpretation.

use serde_json::Value;

use crate::types::{Result, Row};

const CANDIDATE_DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

/// Pick the delimiter that splits the header line into the most fields.
/// Ties resolve in candidate order, so comma wins by default.
pub fn sniff_delimiter(header_line: &str) -> u8 {
    CANDIDATE_DELIMITERS
        .into_iter()
        .max_by_key(|delim| header_line.split(*delim as char).count())
        .unwrap_or(b',')
}

/// Parse CSV bytes into rows keyed by header name.
///
/// Rows shorter than the header are padded with empty cells; longer rows are
/// truncated to the header width. A file with only a header yields zero rows.
pub fn parse(bytes: &[u8]) -> Result<Vec<Row>> {
    let text = String::from_utf8_lossy(bytes);
    let Some(header_line) = text.lines().next() else {
        return Ok(Vec::new());
    };
    let delimiter = sniff_delimiter(header_line);

    match parse_strict(&text, delimiter) {
        Ok(rows) => Ok(rows),
        Err(_) => Ok(parse_naive(&text, delimiter)),
    }
}

fn parse_strict(text: &str, delimiter: u8) -> std::result::Result<Vec<Row>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Row::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("").trim();
            row.insert(header.clone(), Value::String(cell.to_string()));
        }
        rows.push(row);
    }
    Ok(rows)
}

/// Last-resort parser: plain line splitting with no quote handling.
fn parse_naive(text: &str, delimiter: u8) -> Vec<Row> {
    let delim = delimiter as char;
    let mut lines = text.lines();
    let Some(header_line) = lines.next() else {
        return Vec::new();
    };
    let headers: Vec<String> = header_line
        .split(delim)
        .map(|h| h.trim().to_string())
        .collect();

    lines
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let cells: Vec<&str> = line.split(delim).collect();
            let mut row = Row::new();
            for (i, header) in headers.iter().enumerate() {
                let cell = cells.get(i).map(|c| c.trim()).unwrap_or("");
                row.insert(header.clone(), Value::String(cell.to_string()));
            }
            row
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniffs_semicolon() {
        assert_eq!(sniff_delimiter("a;b;c"), b';');
        assert_eq!(sniff_delimiter("a,b,c"), b',');
        assert_eq!(sniff_delimiter("a\tb\tc\td"), b'\t');
        assert_eq!(sniff_delimiter("plain"), b',');
    }

    #[test]
    fn test_parses_comma_csv() {
        let rows = parse(b"name,amount\nalice,10\nbob,20\n").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["name"], "alice");
        assert_eq!(rows[1]["amount"], "20");
    }

    #[test]
    fn test_short_rows_are_padded() {
        let rows = parse(b"a,b,c\n1,2\n").unwrap();
        assert_eq!(rows[0]["c"], "");
    }

    #[test]
    fn test_long_rows_are_truncated_to_header() {
        let rows = parse(b"a,b\n1,2,3,4\n").unwrap();
        assert_eq!(rows[0].len(), 2);
    }

    #[test]
    fn test_quoted_fields_preserve_delimiter() {
        let rows = parse(b"name,notes\nalice,\"x, y\"\n").unwrap();
        assert_eq!(rows[0]["notes"], "x, y");
    }

    #[test]
    fn test_header_only_yields_no_rows() {
        assert!(parse(b"a,b,c\n").unwrap().is_empty());
        assert!(parse(b"").unwrap().is_empty());
    }

    #[test]
    fn test_naive_fallback_splits_lines() {
        let rows = parse_naive("a|b\n1|2\n\n3|4", b'|');
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1]["b"], "4");
    }
}
