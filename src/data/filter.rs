use crate::error::{Result, ThematicError};

use super::model::AttributeTable;
use super::sample::Sample;

// ---------------------------------------------------------------------------
// Field split: which features carry a usable value for the chosen field
// ---------------------------------------------------------------------------

/// One field of a table divided into classifiable values and features without data.
#[derive(Debug, Clone, Default)]
pub struct FieldSplit {
    /// `(feature id, value)` for every feature with a finite numeric value.
    pub valid: Vec<(usize, f64)>,
    /// Ids of features whose value is missing, non-numeric or non-finite.
    pub invalid: Vec<usize>,
}

impl FieldSplit {
    /// The valid values as a classification sample; invalid features count as dropped.
    pub fn sample(&self) -> Sample {
        let valid = self.valid.iter().map(|&(_, v)| Some(v));
        Sample::from_optional(valid.chain(self.invalid.iter().map(|_| None)))
    }
}

/// Split `field` of `table` into valid values and features without data.
///
/// A feature is invalid when:
/// * it has no entry for the field
/// * the entry is null, empty or non-numeric text
/// * the value is NaN or infinite
pub fn split_field(table: &AttributeTable, field: &str) -> Result<FieldSplit> {
    if !table.has_column(field) {
        return Err(ThematicError::InvalidInput(format!(
            "field '{field}' does not exist (columns: {})",
            table.column_names.join(", ")
        )));
    }

    let mut split = FieldSplit::default();
    for feature in &table.features {
        match feature.get(field).and_then(|v| v.as_f64()) {
            Some(v) => split.valid.push((feature.id, v)),
            None => split.invalid.push(feature.id),
        }
    }

    if !split.invalid.is_empty() {
        log::warn!(
            "{} of {} features have no numeric value for '{field}'",
            split.invalid.len(),
            table.len()
        );
    }
    Ok(split)
}
