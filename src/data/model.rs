use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// FieldValue – a single cell of an attribute column
// ---------------------------------------------------------------------------

/// A dynamically-typed attribute value as found in CSV, JSON or Parquet input.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(s) => write!(f, "{s}"),
            FieldValue::Integer(i) => write!(f, "{i}"),
            FieldValue::Float(v) => write!(f, "{v:.4}"),
            FieldValue::Bool(b) => write!(f, "{b}"),
            FieldValue::Null => write!(f, "<null>"),
        }
    }
}

impl FieldValue {
    /// Interpret the value as a finite `f64` observation.
    ///
    /// Numeric text (`" 12.5 "`) counts; booleans, nulls, empty text, NaN and
    /// infinities do not.
    pub fn as_f64(&self) -> Option<f64> {
        let v = match self {
            FieldValue::Float(v) => *v,
            FieldValue::Integer(i) => *i as f64,
            FieldValue::Text(s) => s.trim().parse::<f64>().ok()?,
            FieldValue::Bool(_) | FieldValue::Null => return None,
        };
        v.is_finite().then_some(v)
    }

    /// Whether the value is stored with a numeric type (not merely parseable text).
    pub fn is_numeric_type(&self) -> bool {
        matches!(self, FieldValue::Integer(_) | FieldValue::Float(_))
    }
}

// ---------------------------------------------------------------------------
// Feature – one row of the attribute table
// ---------------------------------------------------------------------------

/// A single feature (one row of the source table).
#[derive(Debug, Clone)]
pub struct Feature {
    /// Zero-based position in the source file.
    pub id: usize,
    /// Attribute columns: column_name → value.
    pub attributes: BTreeMap<String, FieldValue>,
}

impl Feature {
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        self.attributes.get(column)
    }
}

// ---------------------------------------------------------------------------
// AttributeTable – the complete loaded table
// ---------------------------------------------------------------------------

/// The full parsed table with a pre-computed column index.
#[derive(Debug, Clone, Default)]
pub struct AttributeTable {
    /// All features (rows).
    pub features: Vec<Feature>,
    /// Sorted list of column names.
    pub column_names: Vec<String>,
    /// Columns holding at least one value with a numeric type.
    numeric_columns: BTreeSet<String>,
}

impl AttributeTable {
    /// Build the column index from loaded features.
    pub fn from_features(features: Vec<Feature>) -> Self {
        let mut column_names_set: BTreeSet<String> = BTreeSet::new();
        let mut numeric_columns: BTreeSet<String> = BTreeSet::new();

        for feature in &features {
            for (col, val) in &feature.attributes {
                column_names_set.insert(col.clone());
                if val.is_numeric_type() {
                    numeric_columns.insert(col.clone());
                }
            }
        }

        AttributeTable {
            features,
            column_names: column_names_set.into_iter().collect(),
            numeric_columns,
        }
    }

    /// Columns usable for classification, in name order.
    pub fn numeric_fields(&self) -> Vec<&str> {
        self.numeric_columns.iter().map(String::as_str).collect()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.column_names.iter().any(|c| c == column)
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}
