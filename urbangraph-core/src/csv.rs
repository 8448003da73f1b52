//! Tolerant CSV ingestion for backend-generated tables.
//!
//! The backend emits graph data as CSV text embedded in JSON responses. The
//! dialect has drifted over time: quoted fields around street names, UTF-8
//! byte-order marks at the start of payloads, non-breaking spaces around
//! values, and locale-variant decimal commas inside numbers. Everything here
//! degrades gracefully — a malformed cell yields an empty string or `None`,
//! never an error.

use std::collections::HashMap;

/// Characters that show up around field boundaries but carry no data:
/// whitespace, carriage returns, BOM, non-breaking and narrow no-break space.
const FIELD_JUNK: &[char] = &[' ', '\t', '\r', '\u{feff}', '\u{a0}', '\u{202f}'];

/// Parse CSV text into one string-keyed record per non-empty data line.
///
/// The first line is the header; header names are lower-cased and used as
/// record keys. Values map positionally onto headers: missing trailing values
/// become empty strings, surplus values are ignored. Empty input, header-only
/// input and blank lines all produce an empty result, not an error.
pub fn parse_table(text: &str) -> Vec<HashMap<String, String>> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());

    let headers: Vec<String> = match lines.next() {
        Some(header_line) => split_line(header_line)
            .iter()
            .map(|h| clean(h).to_lowercase())
            .collect(),
        None => return Vec::new(),
    };

    lines
        .map(|line| {
            let values = split_line(line);
            headers
                .iter()
                .enumerate()
                .map(|(index, header)| {
                    let value = values.get(index).map(|v| clean(v)).unwrap_or_default();
                    (header.clone(), value.to_string())
                })
                .collect()
        })
        .collect()
}

/// Split one CSV line into raw fields, honoring double-quoted fields.
///
/// Inside quotes a comma is literal and a doubled quote is an escaped quote.
/// Quotes are only special at the start of a field; a stray quote mid-field
/// is kept as-is.
fn split_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    current.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim_matches(FIELD_JUNK).is_empty() => {
                current.clear();
                in_quotes = true;
            }
            ',' if !in_quotes => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

/// Strip boundary artifacts (whitespace, BOM, non-breaking spaces) from a
/// field value.
fn clean(value: &str) -> &str {
    value.trim_matches(FIELD_JUNK)
}

/// Parse a numeric cell, tolerating locale-variant formatting.
///
/// Decimal commas are normalized to points and space-like junk is stripped
/// anywhere in the value. Returns `None` for anything unparseable or
/// non-finite — callers must skip such records rather than defaulting to
/// zero, since `0` is a valid coordinate and metric value.
pub fn parse_number(value: &str) -> Option<f64> {
    let cleaned: String = value
        .chars()
        .filter(|c| !matches!(c, ' ' | '\t' | '\u{feff}' | '\u{a0}' | '\u{202f}' | '\u{2009}'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    match cleaned.replace(',', ".").parse::<f64>() {
        Ok(parsed) if parsed.is_finite() => Some(parsed),
        _ => None,
    }
}

/// Parse a boolean cell: `true`/`1`/`yes` (case-insensitive) are true,
/// everything else (including empty) is false.
pub fn parse_bool(value: &str) -> bool {
    matches!(
        clean(value).to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_record_has_one_value_per_header() {
        let table = parse_table("id,lat,lon\n1,55.75,37.61\n2,55.76\n3");
        assert_eq!(table.len(), 3);
        for record in &table {
            assert_eq!(record.len(), 3);
        }
        assert_eq!(table[1]["lon"], "");
        assert_eq!(table[2]["lat"], "");
        assert_eq!(table[2]["id"], "3");
    }

    #[test]
    fn headers_are_lowercased() {
        let table = parse_table("ID,Latitude\n5,55.75");
        assert_eq!(table[0]["id"], "5");
        assert_eq!(table[0]["latitude"], "55.75");
    }

    #[test]
    fn quoted_fields_keep_delimiters_and_escaped_quotes() {
        let table = parse_table("id,name\n1,\"Main, North\"\n2,\"The \"\"Loop\"\"\"");
        assert_eq!(table[0]["name"], "Main, North");
        assert_eq!(table[1]["name"], "The \"Loop\"");
    }

    #[test]
    fn bom_and_nbsp_artifacts_are_stripped() {
        let table = parse_table("\u{feff}id,name\n\u{a0}7\u{a0},\u{202f}Arbat");
        assert_eq!(table[0]["id"], "7");
        assert_eq!(table[0]["name"], "Arbat");
    }

    #[test]
    fn crlf_and_blank_lines_are_tolerated() {
        let table = parse_table("id,lat\r\n\r\n1,55.75\r\n\n2,55.76\n");
        assert_eq!(table.len(), 2);
        assert_eq!(table[1]["lat"], "55.76");
    }

    #[test]
    fn degenerate_inputs_yield_empty_tables() {
        assert!(parse_table("").is_empty());
        assert!(parse_table("id,lat,lon").is_empty());
        assert!(parse_table("\n\n  \n").is_empty());
    }

    #[test]
    fn parse_number_normalizes_decimal_comma() {
        assert_eq!(parse_number("55,7504"), Some(55.7504));
        assert_eq!(parse_number("55.7504"), Some(55.7504));
        assert_eq!(parse_number("\u{feff}0"), Some(0.0));
        assert_eq!(parse_number(" -37.61 "), Some(-37.61));
    }

    #[test]
    fn parse_number_rejects_garbage() {
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn parse_bool_accepts_known_truths_only() {
        assert!(parse_bool("true"));
        assert!(parse_bool("True"));
        assert!(parse_bool("1"));
        assert!(parse_bool("YES"));
        assert!(!parse_bool("0"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
        assert!(!parse_bool("да"));
    }
}
