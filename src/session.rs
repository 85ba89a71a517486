use std::path::PathBuf;

use crate::classify::{self, Classification};
use crate::color::Rgba;
use crate::config::StyleParams;
use crate::data::{split_field, AttributeTable, Sample, SampleStats};
use crate::error::{Result, ThematicError};
use crate::preset::PresetStore;
use crate::render::{self, RenderSpec};
use crate::style::StyleSpec;

// ---------------------------------------------------------------------------
// Styling session
// ---------------------------------------------------------------------------

/// One layer being styled: its table, the chosen field and parameters, and
/// the style currently in effect.
///
/// The current style is only ever replaced as a whole, by [`apply`] or
/// [`load_preset`]; a failing call leaves it as it was.
///
/// [`apply`]: StyleSession::apply
/// [`load_preset`]: StyleSession::load_preset
#[derive(Debug)]
pub struct StyleSession {
    table: Option<AttributeTable>,
    field: Option<String>,

    /// Parameters for the next [`StyleSession::apply`].
    pub params: StyleParams,

    current: Option<StyleSpec>,
    last_classification: Option<Classification>,

    /// Outcome of the last operation, for display.
    status: Option<String>,

    store: PresetStore,
}

impl StyleSession {
    pub fn new(store: PresetStore) -> Self {
        Self {
            table: None,
            field: None,
            params: StyleParams::default(),
            current: None,
            last_classification: None,
            status: None,
            store,
        }
    }

    /// Ingest a newly loaded table and pick its first numeric field.
    pub fn set_table(&mut self, table: AttributeTable) {
        self.field = table.numeric_fields().first().map(|f| f.to_string());
        self.table = Some(table);
        self.current = None;
        self.last_classification = None;
        self.status = None;
    }

    pub fn set_field(&mut self, field: &str) -> Result<()> {
        let table = self.table()?;
        if !table.has_column(field) {
            return Err(ThematicError::InvalidInput(format!(
                "field '{field}' does not exist (columns: {})",
                table.column_names.join(", ")
            )));
        }
        self.field = Some(field.to_string());
        Ok(())
    }

    pub fn field(&self) -> Option<&str> {
        self.field.as_deref()
    }

    fn table(&self) -> Result<&AttributeTable> {
        self.table
            .as_ref()
            .ok_or_else(|| ThematicError::InvalidInput("no attribute table loaded".to_string()))
    }

    fn require_field(&self) -> Result<&str> {
        self.field
            .as_deref()
            .ok_or_else(|| ThematicError::InvalidInput("no field selected".to_string()))
    }

    /// Valid values of the selected field.
    pub fn sample(&self) -> Result<Sample> {
        Ok(split_field(self.table()?, self.require_field()?)?.sample())
    }

    pub fn stats(&self) -> Result<SampleStats> {
        self.sample()?.stats()
    }

    /// Classify the selected field with the current parameters and make the
    /// result the current style.
    pub fn apply(&mut self) -> Result<&StyleSpec> {
        match self.build_style() {
            Ok((classification, spec)) => {
                self.status = Some(match &classification.substitution {
                    Some(s) => format!("{} used instead of {}: {}", s.used, s.requested, s.reason),
                    None => format!("{} classes by {}", spec.class_count(), spec.method()),
                });
                self.last_classification = Some(classification);
                Ok(self.current.insert(spec))
            }
            Err(e) => {
                self.status = Some(e.to_string());
                Err(e)
            }
        }
    }

    fn build_style(&self) -> Result<(Classification, StyleSpec)> {
        let field = self.require_field()?;
        if let Some(labels) = &self.params.feature_labels {
            let table = self.table()?;
            if !table.has_column(&labels.field) {
                return Err(ThematicError::InvalidInput(format!(
                    "label field '{}' does not exist (columns: {})",
                    labels.field,
                    table.column_names.join(", ")
                )));
            }
        }
        let sample = self.sample()?;
        let classification = classify::classify_with(
            &sample,
            self.params.classes,
            self.params.method,
            &self.params.classify,
        )?;
        let spec = self.params.style(field, &classification)?;
        Ok((classification, spec))
    }

    pub fn current(&self) -> Option<&StyleSpec> {
        self.current.as_ref()
    }

    pub fn last_classification(&self) -> Option<&Classification> {
        self.last_classification.as_ref()
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn store(&self) -> &PresetStore {
        &self.store
    }

    pub fn render(&self) -> Option<RenderSpec> {
        self.current.as_ref().map(render::build)
    }

    /// Fill color of every feature in table order; features without data are transparent.
    pub fn feature_paints(&self) -> Result<Vec<(usize, Rgba)>> {
        let render = self
            .render()
            .ok_or_else(|| ThematicError::Validation("no style applied".to_string()))?;
        let table = self.table()?;
        Ok(table
            .features
            .iter()
            .map(|f| {
                let value = f.get(&render.field).and_then(|v| v.as_f64());
                (f.id, render.paint_for(value))
            })
            .collect())
    }

    /// Save the current style as preset `name`.
    pub fn save_preset(&mut self, name: &str) -> Result<PathBuf> {
        let spec = self
            .current
            .as_ref()
            .ok_or_else(|| ThematicError::Validation("no style to save".to_string()))?;
        let result = self.store.save(spec, name);
        self.status = Some(match &result {
            Ok(path) => format!("saved '{name}' to {}", path.display()),
            Err(e) => e.to_string(),
        });
        result
    }

    /// Replace the current style and parameters with preset `name`.
    pub fn load_preset(&mut self, name: &str) -> Result<&StyleSpec> {
        match self.store.load(name) {
            Ok(spec) => {
                self.params = StyleParams {
                    classify: self.params.classify.clone(),
                    ..StyleParams::from_spec(&spec)
                };
                self.field = Some(spec.field().to_string());
                self.last_classification = None;
                self.status = Some(format!("loaded '{name}'"));
                Ok(self.current.insert(spec))
            }
            Err(e) => {
                self.status = Some(e.to_string());
                Err(e)
            }
        }
    }
}
