//! The structure handed to a map renderer: one entry per class, ascending.

use serde::Serialize;

use crate::color::Rgba;
use crate::style::{LabelStyle, StyleSpec};

/// One class of the rendered legend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderClass {
    pub index: usize,
    pub lower: f64,
    pub upper: f64,
    /// Only the last class includes its upper bound.
    pub upper_inclusive: bool,
    pub color: Rgba,
    pub label: String,
}

impl RenderClass {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower
            && (value < self.upper || (self.upper_inclusive && value == self.upper))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderSpec {
    pub field: String,
    pub classes: Vec<RenderClass>,
    pub border_color: Rgba,
    /// Millimetres.
    pub border_width: f64,
    pub opacity: f64,
    pub feature_labels: Option<LabelStyle>,
}

/// Flatten a style into renderer input.
pub fn build(spec: &StyleSpec) -> RenderSpec {
    let last = spec.class_count() - 1;
    let classes = spec
        .breaks()
        .intervals()
        .zip(spec.colors())
        .zip(spec.labels())
        .enumerate()
        .map(|(index, (((lower, upper), &color), label))| RenderClass {
            index,
            lower,
            upper,
            upper_inclusive: index == last,
            color,
            label: label.clone(),
        })
        .collect();

    RenderSpec {
        field: spec.field().to_string(),
        classes,
        border_color: spec.border_color(),
        border_width: spec.border_width(),
        opacity: spec.opacity(),
        feature_labels: spec.feature_labels().cloned(),
    }
}

impl RenderSpec {
    /// The class a value falls in, `None` outside the classified range.
    pub fn class_for(&self, value: f64) -> Option<&RenderClass> {
        // Zero-width classes never match, so the first match is the right one.
        self.classes.iter().find(|c| c.contains(value))
    }

    /// Fill color for a feature; missing or unclassified values are hidden.
    pub fn paint_for(&self, value: Option<f64>) -> Rgba {
        value
            .and_then(|v| self.class_for(v))
            .map_or(Rgba::TRANSPARENT, |c| c.color)
    }
}
