use std::path::PathBuf;

use crate::classify::{Classification, ClassifyOptions, Method};
use crate::color::{ColorScheme, Interpolation, Rgba};
use crate::error::Result;
use crate::style::{LabelFormat, LabelStyle, RampSource, StyleSpec};

/// Environment variable naming the preset directory.
pub const STYLES_DIR_ENV: &str = "THEMATIC_STYLES_DIR";

/// Preset directory used when [`STYLES_DIR_ENV`] is unset.
pub const DEFAULT_STYLES_DIR: &str = "saved_styles";

/// Preset directory: `$THEMATIC_STYLES_DIR`, or `saved_styles` in the working directory.
pub fn styles_dir() -> PathBuf {
    std::env::var_os(STYLES_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_STYLES_DIR))
}

// ---------------------------------------------------------------------------
// Style parameters
// ---------------------------------------------------------------------------

/// Everything a user chooses before classifying.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleParams {
    pub method: Method,
    pub classes: usize,
    pub scheme: ColorScheme,
    pub reversed: bool,
    pub interpolation: Interpolation,
    pub border_color: Rgba,
    /// Millimetres.
    pub border_width: f64,
    pub opacity: f64,
    pub label_format: LabelFormat,
    pub feature_labels: Option<LabelStyle>,
    pub classify: ClassifyOptions,
}

impl Default for StyleParams {
    fn default() -> Self {
        Self {
            method: Method::Quantile,
            classes: 5,
            scheme: ColorScheme::Blue,
            reversed: false,
            interpolation: Interpolation::Endpoints,
            border_color: Rgba::rgb(50, 50, 50),
            border_width: 0.2,
            opacity: 1.0,
            label_format: LabelFormat::default(),
            feature_labels: None,
            classify: ClassifyOptions::default(),
        }
    }
}

impl StyleParams {
    /// Parameters that reproduce `spec` when applied to the same data.
    pub fn from_spec(spec: &StyleSpec) -> Self {
        let defaults = Self::default();
        let ramp = spec.ramp().copied().unwrap_or_else(|| RampSource {
            scheme: defaults.scheme,
            reversed: defaults.reversed,
            interpolation: defaults.interpolation,
        });
        Self {
            method: spec.method(),
            classes: spec.class_count(),
            scheme: ramp.scheme,
            reversed: ramp.reversed,
            interpolation: ramp.interpolation,
            border_color: spec.border_color(),
            border_width: spec.border_width(),
            opacity: spec.opacity(),
            label_format: spec.label_format().clone(),
            feature_labels: spec.feature_labels().cloned(),
            classify: defaults.classify,
        }
    }

    pub fn ramp(&self) -> RampSource {
        RampSource::new(self.scheme, self.reversed).with_interpolation(self.interpolation)
    }

    /// Color `classification` with these parameters.
    pub fn style(&self, field: &str, classification: &Classification) -> Result<StyleSpec> {
        let ramp = self.ramp();
        StyleSpec::build(
            classification.breaks.clone(),
            ramp.colors(classification.class_count()),
            self.border_color,
            self.border_width,
            self.opacity,
            field,
            classification.method,
        )?
        .with_label_format(self.label_format.clone())
        .with_ramp(Some(ramp))
        .with_feature_labels(self.feature_labels.clone())
    }
}
