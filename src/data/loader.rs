use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{AttributeTable, Feature, FieldValue};

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an attribute table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.parquet` – flat columns of strings, integers, floats or booleans
/// * `.json`    – `[{ "name": "north", "population": 1200, ... }, ...]`
/// * `.csv`     – header row with column names, one feature per row
pub fn load_file(path: &Path) -> Result<AttributeTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "parquet" | "pq" => load_parquet(path),
        "json" => load_json(path),
        "csv" => load_csv(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} features with columns {:?}",
        table.len(),
        table.column_names
    );
    Ok(table)
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, one object per feature):
///
/// ```json
/// [
///   { "region": "north", "population": 1200, "density": 14.5 },
///   { "region": "south", "population": null, "density": "n/a" }
/// ]
/// ```
fn load_json(path: &Path) -> Result<AttributeTable> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    parse_json(&text)
}

pub(crate) fn parse_json(text: &str) -> Result<AttributeTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;

    let records = root.as_array().context("Expected top-level JSON array")?;

    let mut features = Vec::with_capacity(records.len());
    for (id, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {id} is not a JSON object"))?;

        let attributes = obj
            .iter()
            .map(|(key, val)| (key.clone(), json_to_field(val)))
            .collect();
        features.push(Feature { id, attributes });
    }

    Ok(AttributeTable::from_features(features))
}

fn json_to_field(val: &JsonValue) -> FieldValue {
    match val {
        JsonValue::String(s) => FieldValue::Text(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                FieldValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                FieldValue::Float(f)
            } else {
                FieldValue::Text(n.to_string())
            }
        }
        JsonValue::Bool(b) => FieldValue::Bool(*b),
        JsonValue::Null => FieldValue::Null,
        other => FieldValue::Text(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row with column names, every other row is one feature.
/// Cell types are guessed per cell; empty cells are null.
fn load_csv(path: &Path) -> Result<AttributeTable> {
    let reader = csv::Reader::from_path(path).context("opening CSV")?;
    read_csv(reader)
}

pub(crate) fn read_csv<R: std::io::Read>(mut reader: csv::Reader<R>) -> Result<AttributeTable> {
    let headers: Vec<String> = reader
        .headers()
        .context("reading CSV headers")?
        .iter()
        .map(|h| h.to_string())
        .collect();

    let mut features = Vec::new();
    for (id, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("CSV row {id}"))?;

        let mut attributes = BTreeMap::new();
        for (col_idx, value) in record.iter().enumerate() {
            let Some(col_name) = headers.get(col_idx) else {
                bail!("CSV row {id}: more cells than header columns");
            };
            attributes.insert(col_name.clone(), guess_field_type(value));
        }
        features.push(Feature { id, attributes });
    }

    Ok(AttributeTable::from_features(features))
}

fn guess_field_type(s: &str) -> FieldValue {
    let s = s.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("null") {
        return FieldValue::Null;
    }
    if let Ok(i) = s.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = s.parse::<f64>() {
        return FieldValue::Float(f);
    }
    if s == "true" || s == "false" {
        return FieldValue::Bool(s == "true");
    }
    FieldValue::Text(s.to_string())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file whose columns are feature attributes.
///
/// Utf8, Int32/Int64, Float32/Float64 and Boolean columns are read; any other
/// column type is kept as text describing the type so it never classifies.
fn load_parquet(path: &Path) -> Result<AttributeTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder =
        ParquetRecordBatchReaderBuilder::try_new(file).context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut features = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let columns: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let mut attributes = BTreeMap::new();
            for (col_idx, col_name) in &columns {
                let value = extract_field_value(batch.column(*col_idx), row);
                attributes.insert(col_name.clone(), value);
            }
            let id = features.len();
            features.push(Feature { id, attributes });
        }
    }

    Ok(AttributeTable::from_features(features))
}

/// Extract a single attribute value from an Arrow column at a given row.
fn extract_field_value(col: &Arc<dyn Array>, row: usize) -> FieldValue {
    if col.is_null(row) {
        return FieldValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map(|a| FieldValue::Text(a.value(row).to_string()))
            .unwrap_or(FieldValue::Null),
        DataType::LargeUtf8 => FieldValue::Text(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map(|a| FieldValue::Integer(a.value(row) as i64))
            .unwrap_or(FieldValue::Null),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map(|a| FieldValue::Integer(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map(|a| FieldValue::Float(a.value(row) as f64))
            .unwrap_or(FieldValue::Null),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map(|a| FieldValue::Float(a.value(row)))
            .unwrap_or(FieldValue::Null),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map(|a| FieldValue::Bool(a.value(row)))
            .unwrap_or(FieldValue::Null),
        other => FieldValue::Text(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_records() {
        let table = parse_json(
            r#"[{"region": "north", "pop": 1200, "density": 14.5},
                {"region": "south", "pop": null, "density": "n/a"}]"#,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_names, vec!["density", "pop", "region"]);
        assert_eq!(table.features[0].get("pop"), Some(&FieldValue::Integer(1200)));
        assert_eq!(table.features[1].get("pop"), Some(&FieldValue::Null));
        assert_eq!(table.numeric_fields(), vec!["density", "pop"]);
    }

    #[test]
    fn test_parse_json_rejects_non_array() {
        assert!(parse_json(r#"{"region": "north"}"#).is_err());
    }

    #[test]
    fn test_read_csv_guesses_types() {
        let data = "region,pop,share\nnorth,10,0.5\nsouth,,abc\n";
        let table = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.features[0].get("pop"), Some(&FieldValue::Integer(10)));
        assert_eq!(table.features[0].get("share"), Some(&FieldValue::Float(0.5)));
        assert_eq!(table.features[1].get("pop"), Some(&FieldValue::Null));
        assert_eq!(
            table.features[1].get("share"),
            Some(&FieldValue::Text("abc".into()))
        );
    }
}
