//! Delimited text decoding into location records and encoding of result rows.

use crate::domain::model::{FieldValue, LocationField, Record};
use crate::utils::error::{Result, ScanError};
use serde::Serialize;
use serde_json::{Map, Value};

/// Best-effort mapping of a CSV table onto [`Record`]s.
///
/// The header row decides which column feeds which field; unknown columns are
/// ignored and columns a row does not have stay [`FieldValue::Missing`]. Rows
/// are never rejected, so this never fails: a table without a usable header
/// just yields no records.
pub fn decode(text: &str) -> Vec<Record> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let columns: Vec<Option<LocationField>> = match reader.headers() {
        Ok(headers) => headers.iter().map(LocationField::from_header).collect(),
        Err(e) => {
            tracing::warn!("⚠️ Could not read header row: {}", e);
            return Vec::new();
        }
    };

    if columns.iter().all(Option::is_none) {
        tracing::warn!("⚠️ Header row has none of the expected columns");
    }

    let mut records = Vec::new();
    for (index, row) in reader.records().enumerate() {
        let row = match row {
            Ok(row) => row,
            Err(e) => {
                tracing::warn!("⚠️ Skipping unreadable row {}: {}", index + 1, e);
                continue;
            }
        };

        if row.len() != columns.len() {
            tracing::debug!(
                "Row {} has {} fields, header has {}",
                index + 1,
                row.len(),
                columns.len()
            );
        }

        let mut record = Record::new();
        for (column, value) in columns.iter().zip(row.iter()) {
            if let Some(field) = column {
                record.set(*field, FieldValue::Present(value.to_string()));
            }
        }
        records.push(record);
    }

    tracing::debug!("Decoded {} records", records.len());
    records
}

/// Serializes rows to CSV with a header built from the union of their keys.
///
/// Columns keep the order in which keys were first seen. A key a row does not
/// carry becomes an empty cell.
pub fn encode<T: Serialize>(rows: &[T]) -> Result<String> {
    let mut objects = Vec::with_capacity(rows.len());
    for row in rows {
        let object = match serde_json::to_value(row)? {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        objects.push(object);
    }

    let mut columns: Vec<String> = Vec::new();
    for object in &objects {
        for key in object.keys() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    if columns.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());

    writer.write_record(&columns)?;
    for object in &objects {
        writer.write_record(columns.iter().map(|column| cell(object.get(column))))?;
    }

    let bytes = writer.into_inner().map_err(|e| e.into_error())?;
    String::from_utf8(bytes)
        .map_err(|e| ScanError::IoError(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

fn cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::SubmissionResult;

    const TABLE: &str = "Name,Address,Phone,City,State,Zip Code\n\
        Acme,1 Main St,555-0100,Springfield,IL,62701\n\
        \"Bolt, Inc\",2 Side Ave,555-0101,Shelbyville,IL,62565\n";

    #[test]
    fn test_decode_maps_headers_to_fields() {
        let records = decode(TABLE);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), Some("Acme"));
        assert_eq!(records[0].get(LocationField::Zip).as_str(), Some("62701"));
        assert_eq!(records[1].name(), Some("Bolt, Inc"));
        assert_eq!(records[1].get(LocationField::City).as_str(), Some("Shelbyville"));
    }

    #[test]
    fn test_decode_short_rows_leave_fields_missing() {
        let records = decode("Name,Address,Phone\nAcme\nBolt,2 Side Ave,555-0101,extra\n");

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].name(), Some("Acme"));
        assert!(records[0].get(LocationField::Address).is_missing());
        assert!(records[0].get(LocationField::Zip).is_missing());
        assert_eq!(records[1].get(LocationField::Phone).as_str(), Some("555-0101"));
    }

    #[test]
    fn test_decode_header_match_is_exact() {
        let records = decode("name,Zip code,Zip Code\nAcme,1,2\n");

        assert_eq!(records.len(), 1);
        assert!(records[0].get(LocationField::Name).is_missing());
        assert_eq!(records[0].get(LocationField::Zip).as_str(), Some("2"));
    }

    #[test]
    fn test_decode_odd_input_does_not_fail() {
        assert!(decode("").is_empty());
        assert!(decode("Name\n").is_empty());
        assert_eq!(decode("\u{feff}Name\nAcme\n")[0].name(), Some("Acme"));
        assert_eq!(decode("Name,\"Address\nAcme").len(), 0);
    }

    #[test]
    fn test_encode_uses_union_of_keys_in_first_seen_order() {
        let mut enriched = SubmissionResult::submitted("A", "j1");
        enriched.reviews_percentile = Some("90.00%".to_string());
        enriched.listings_inaccuracy = Some("-".to_string());
        let rows = vec![SubmissionResult::failed("B"), enriched];

        let text = encode(&rows).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines,
            vec![
                "name,jobId,success,reviewsPercentile,listingsInaccuracy",
                "B,,false,,",
                "A,j1,true,90.00%,-",
            ]
        );
    }

    #[test]
    fn test_encode_empty_rows() {
        let rows: Vec<SubmissionResult> = Vec::new();
        assert_eq!(encode(&rows).unwrap(), "");
    }

    #[test]
    fn test_round_trip_preserves_rows() {
        let records = decode(TABLE);
        let text = encode(&records).unwrap();
        let again = decode(&text);

        assert_eq!(again.len(), records.len());
        assert_eq!(again, records);
    }
}
