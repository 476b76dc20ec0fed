//! Format parser: CSV/TSV/JSON text conversion.
//!
//! Purely syntactic — no knowledge of what the fields mean. The JSON side is
//! always an array of flat objects; the delimited side always carries a
//! header row. Unimplemented pairs (anything involving XML) fail loudly with
//! `NotImplemented` instead of passing bytes through.

use indexmap::IndexSet;
use serde_json::{Map, Number, Value};
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Supported text representations of a catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Csv,
    Tsv,
    Json,
    /// Declared but unimplemented; every conversion involving it fails with
    /// `NotImplemented`.
    Xml,
}

impl DataFormat {
    /// File extension for export file names.
    pub fn extension(&self) -> &'static str {
        match self {
            DataFormat::Csv => "csv",
            DataFormat::Tsv => "tsv",
            DataFormat::Json => "json",
            DataFormat::Xml => "xml",
        }
    }

    fn delimiter(&self) -> Option<u8> {
        match self {
            DataFormat::Csv => Some(b','),
            DataFormat::Tsv => Some(b'\t'),
            _ => None,
        }
    }
}

impl FromStr for DataFormat {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(DataFormat::Csv),
            "tsv" => Ok(DataFormat::Tsv),
            "json" => Ok(DataFormat::Json),
            "xml" => Ok(DataFormat::Xml),
            other => Err(AppError::BadRequest(format!("unknown format '{}'", other))),
        }
    }
}

impl std::fmt::Display for DataFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Convert catalogue text between two formats. The identity case returns the
/// input unchanged.
pub fn convert(input: &str, from: DataFormat, to: DataFormat) -> AppResult<String> {
    if from == to {
        return Ok(input.to_string());
    }
    match (from, to) {
        (DataFormat::Csv | DataFormat::Tsv, DataFormat::Json) => {
            delimited_to_json(input, from.delimiter().expect("delimited format"))
        }
        (DataFormat::Json, DataFormat::Csv | DataFormat::Tsv) => {
            json_to_delimited(input, to.delimiter().expect("delimited format"))
        }
        (from, to) => Err(AppError::NotImplemented(format!(
            "conversion {} -> {} is not supported",
            from, to
        ))),
    }
}

/// Header row becomes object keys; each cell goes through dynamic typing.
/// Empty lines are skipped by the reader.
fn delimited_to_json(input: &str, delimiter: u8) -> AppResult<String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(input.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let mut row = Map::new();
        for (idx, header) in headers.iter().enumerate() {
            let cell = record.get(idx).unwrap_or("");
            row.insert(header.clone(), dynamic_type(cell));
        }
        rows.push(Value::Object(row));
    }
    Ok(serde_json::to_string(&Value::Array(rows))?)
}

/// Inverse direction; a header row is always emitted, keyed in first-seen
/// order across all rows.
fn json_to_delimited(input: &str, delimiter: u8) -> AppResult<String> {
    let value: Value = serde_json::from_str(input)?;
    let rows = match value {
        Value::Array(rows) => rows,
        _ => {
            return Err(AppError::BadRequest(
                "expected a JSON array of row objects".to_string(),
            ))
        }
    };

    let mut headers: IndexSet<String> = IndexSet::new();
    for row in &rows {
        if let Value::Object(map) = row {
            for key in map.keys() {
                headers.insert(key.clone());
            }
        }
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(headers.iter())?;
    for row in &rows {
        let map = match row {
            Value::Object(map) => map,
            _ => {
                return Err(AppError::BadRequest(
                    "expected a JSON array of row objects".to_string(),
                ))
            }
        };
        let record: Vec<String> = headers
            .iter()
            .map(|h| cell_text(map.get(h).unwrap_or(&Value::Null)))
            .collect::<AppResult<Vec<String>>>()?;
        writer.write_record(&record)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| AppError::BadRequest(format!("CSV write failed: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| AppError::BadRequest(format!("non-UTF-8 CSV output: {}", e)))
}

/// Numeric-looking cells become numbers, empty cells become null, everything
/// else stays a string.
fn dynamic_type(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    if let Ok(float) = cell.parse::<f64>() {
        if let Some(number) = Number::from_f64(float) {
            return Value::Number(number);
        }
    }
    Value::String(cell.to_string())
}

fn cell_text(value: &Value) -> AppResult<String> {
    Ok(match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        // Nested values have no delimited representation; serialize them.
        other => serde_json::to_string(other)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity() {
        let input = "a,b\n1,2\n";
        assert_eq!(
            convert(input, DataFormat::Csv, DataFormat::Csv).unwrap(),
            input
        );
    }

    #[test]
    fn test_csv_to_json_dynamic_typing() {
        let csv = "title,year,price\nDune,1965,20.5\nQuijote,1605,swap\n";
        let json = convert(csv, DataFormat::Csv, DataFormat::Json).unwrap();
        let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["year"], Value::from(1965));
        assert_eq!(rows[0]["price"], Value::from(20.5));
        assert_eq!(rows[1]["price"], Value::from("swap"));
    }

    #[test]
    fn test_csv_to_json_empty_cell_is_null() {
        let csv = "title,author\nDune,\n";
        let json = convert(csv, DataFormat::Csv, DataFormat::Json).unwrap();
        let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&json).unwrap();
        assert_eq!(rows[0]["author"], Value::Null);
    }

    #[test]
    fn test_json_to_csv_emits_header() {
        let json = r#"[{"title":"Dune","year":1965},{"title":"Quijote","year":1605}]"#;
        let csv = convert(json, DataFormat::Json, DataFormat::Csv).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("title,year"));
        assert_eq!(lines.next(), Some("Dune,1965"));
        assert_eq!(lines.next(), Some("Quijote,1605"));
    }

    #[test]
    fn test_tsv_round_trip() {
        let json = r#"[{"title":"Dune","year":1965,"price":20.5}]"#;
        let tsv = convert(json, DataFormat::Json, DataFormat::Tsv).unwrap();
        let back = convert(&tsv, DataFormat::Tsv, DataFormat::Json).unwrap();
        let rows: Vec<serde_json::Map<String, Value>> = serde_json::from_str(&back).unwrap();
        assert_eq!(rows[0]["year"], Value::from(1965));
        assert_eq!(rows[0]["price"], Value::from(20.5));
        assert_eq!(rows[0]["title"], Value::from("Dune"));
    }

    #[test]
    fn test_xml_is_not_implemented() {
        let result = convert("<books/>", DataFormat::Xml, DataFormat::Json);
        assert!(matches!(result, Err(AppError::NotImplemented(_))));
        let result = convert("[]", DataFormat::Json, DataFormat::Xml);
        assert!(matches!(result, Err(AppError::NotImplemented(_))));
    }

    #[test]
    fn test_csv_to_tsv_is_not_implemented() {
        // csv -> tsv is not a declared pair either; it must fail loudly, not
        // guess.
        let result = convert("a,b\n1,2\n", DataFormat::Csv, DataFormat::Tsv);
        assert!(matches!(result, Err(AppError::NotImplemented(_))));
    }

    #[test]
    fn test_format_from_str() {
        assert_eq!("CSV".parse::<DataFormat>().unwrap(), DataFormat::Csv);
        assert!("yaml".parse::<DataFormat>().is_err());
    }
}
