use serde::{Deserialize, Serialize};

use crate::classify::{self, ClassBreaks, ClassifyOptions, Method};
use crate::color::{self, ColorScheme, Interpolation, Rgba};
use crate::data::Sample;
use crate::error::{Result, ThematicError};

/// Border width bounds, in millimetres.
pub const MAX_BORDER_WIDTH: f64 = 5.0;

// ---------------------------------------------------------------------------
// Labels
// ---------------------------------------------------------------------------

/// How class intervals are printed in the legend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelFormat {
    /// Digits after the decimal point.
    pub precision: usize,
    pub separator: String,
}

impl LabelFormat {
    pub const MAX_PRECISION: usize = 10;

    /// A format with `precision` capped at [`LabelFormat::MAX_PRECISION`].
    pub fn new(precision: usize, separator: impl Into<String>) -> Self {
        Self {
            precision: precision.min(Self::MAX_PRECISION),
            separator: separator.into(),
        }
    }

    fn value(&self, v: f64) -> String {
        // `+ 0.0` keeps -0.0 from printing as "-0.00".
        format!("{:.*}", self.precision.min(Self::MAX_PRECISION), v + 0.0)
    }

    /// `"lo - hi"`, or just `"lo"` for a zero-width class.
    pub fn label(&self, lo: f64, hi: f64) -> String {
        if lo == hi {
            self.value(lo)
        } else {
            format!("{}{}{}", self.value(lo), self.separator, self.value(hi))
        }
    }
}

impl Default for LabelFormat {
    fn default() -> Self {
        Self::new(2, " - ")
    }
}

/// One label per class, in break order.
pub fn class_labels(breaks: &ClassBreaks, format: &LabelFormat) -> Vec<String> {
    breaks
        .intervals()
        .map(|(lo, hi)| format.label(lo, hi))
        .collect()
}

/// Text drawn on each feature (the attribute value of `field`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub field: String,
    /// Points.
    pub font_size: f64,
    pub font_color: Rgba,
    /// Halo drawn behind the text, if any.
    pub background: Option<Rgba>,
}

impl LabelStyle {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            font_size: 10.0,
            font_color: Rgba::rgb(0, 0, 0),
            background: None,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.field.trim().is_empty() {
            return Err(ThematicError::Validation(
                "feature labels need a field".to_string(),
            ));
        }
        if !(self.font_size.is_finite() && self.font_size > 0.0) {
            return Err(ThematicError::Validation(format!(
                "label font size {} must be a positive number",
                self.font_size
            )));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Ramp provenance
// ---------------------------------------------------------------------------

/// The scheme a style's colors were generated from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RampSource {
    pub scheme: ColorScheme,
    pub reversed: bool,
    #[serde(default)]
    pub interpolation: Interpolation,
}

impl RampSource {
    pub fn new(scheme: ColorScheme, reversed: bool) -> Self {
        Self {
            scheme,
            reversed,
            interpolation: Interpolation::Endpoints,
        }
    }

    pub fn with_interpolation(self, interpolation: Interpolation) -> Self {
        Self {
            interpolation,
            ..self
        }
    }

    /// `k` colors of this ramp.
    pub fn colors(&self, k: usize) -> Vec<Rgba> {
        self.scheme.ramp(k, self.reversed, self.interpolation)
    }
}

// ---------------------------------------------------------------------------
// StyleSpec
// ---------------------------------------------------------------------------

/// A complete, validated choropleth style.
///
/// Immutable: every `with_*` method and [`StyleSpec::reclassify`] returns a
/// new value. Labels are always derived from the breaks and the label format.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleSpec {
    field: String,
    method: Method,
    breaks: ClassBreaks,
    colors: Vec<Rgba>,
    labels: Vec<String>,
    border_color: Rgba,
    border_width: f64,
    opacity: f64,
    label_format: LabelFormat,
    ramp: Option<RampSource>,
    feature_labels: Option<LabelStyle>,
}

impl StyleSpec {
    /// Assemble a style, checking that there is one color per class, that
    /// border width and opacity are in range, and that only quantile breaks
    /// repeat.
    pub fn build(
        breaks: ClassBreaks,
        colors: Vec<Rgba>,
        border_color: Rgba,
        border_width: f64,
        opacity: f64,
        field: impl Into<String>,
        method: Method,
    ) -> Result<Self> {
        if colors.len() != breaks.class_count() {
            return Err(ThematicError::Validation(format!(
                "{} colors for {} classes",
                colors.len(),
                breaks.class_count()
            )));
        }
        if method != Method::Quantile && !breaks.is_strict() {
            return Err(ThematicError::Validation(format!(
                "{method} breaks must be strictly increasing, got {:?}",
                breaks.as_slice()
            )));
        }
        if !(0.0..=MAX_BORDER_WIDTH).contains(&border_width) {
            return Err(ThematicError::Validation(format!(
                "border width {border_width} mm is outside [0, {MAX_BORDER_WIDTH}]"
            )));
        }
        if !(0.0..=1.0).contains(&opacity) {
            return Err(ThematicError::Validation(format!(
                "opacity {opacity} is outside [0, 1]"
            )));
        }

        let label_format = LabelFormat::default();
        let labels = class_labels(&breaks, &label_format);
        Ok(StyleSpec {
            field: field.into(),
            method,
            breaks,
            colors,
            labels,
            border_color,
            border_width,
            opacity,
            label_format,
            ramp: None,
            feature_labels: None,
        })
    }

    pub fn with_label_format(self, format: LabelFormat) -> Self {
        let format = LabelFormat::new(format.precision, format.separator);
        let labels = class_labels(&self.breaks, &format);
        StyleSpec {
            labels,
            label_format: format,
            ..self
        }
    }

    /// Record the scheme the colors came from; the colors themselves are kept.
    pub fn with_ramp(self, ramp: Option<RampSource>) -> Self {
        StyleSpec { ramp, ..self }
    }

    pub fn with_feature_labels(self, feature_labels: Option<LabelStyle>) -> Result<Self> {
        if let Some(style) = &feature_labels {
            style.validate()?;
        }
        Ok(StyleSpec {
            feature_labels,
            ..self
        })
    }

    /// Classify `sample` again with this style's method and class count.
    ///
    /// Colors come from the recorded ramp, or from a gradient through the
    /// current colors when none is recorded. Everything else is kept.
    pub fn reclassify(&self, sample: &Sample, options: &ClassifyOptions) -> Result<StyleSpec> {
        let classification =
            classify::classify_with(sample, self.class_count(), self.method, options)?;
        let k = classification.class_count();
        let colors = match &self.ramp {
            Some(ramp) => ramp.colors(k),
            None => color::generate_multi(&self.colors, k, false)?,
        };
        log::debug!("reclassified '{}' into {k} classes", self.field);

        StyleSpec::build(
            classification.breaks,
            colors,
            self.border_color,
            self.border_width,
            self.opacity,
            self.field.clone(),
            classification.method,
        )?
        .with_label_format(self.label_format.clone())
        .with_ramp(self.ramp)
        .with_feature_labels(self.feature_labels.clone())
    }

    pub fn field(&self) -> &str {
        &self.field
    }

    /// Method that produced the breaks.
    pub fn method(&self) -> Method {
        self.method
    }

    pub fn breaks(&self) -> &ClassBreaks {
        &self.breaks
    }

    pub fn colors(&self) -> &[Rgba] {
        &self.colors
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn border_color(&self) -> Rgba {
        self.border_color
    }

    pub fn border_width(&self) -> f64 {
        self.border_width
    }

    pub fn opacity(&self) -> f64 {
        self.opacity
    }

    pub fn label_format(&self) -> &LabelFormat {
        &self.label_format
    }

    pub fn ramp(&self) -> Option<&RampSource> {
        self.ramp.as_ref()
    }

    pub fn feature_labels(&self) -> Option<&LabelStyle> {
        self.feature_labels.as_ref()
    }

    pub fn class_count(&self) -> usize {
        self.breaks.class_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn breaks() -> ClassBreaks {
        ClassBreaks::new(vec![1.0, 2.8, 4.6, 6.4, 8.2, 10.0]).unwrap()
    }

    fn spec() -> StyleSpec {
        let colors = ColorScheme::Blue.ramp(5, false, Interpolation::Endpoints);
        StyleSpec::build(
            breaks(),
            colors,
            Rgba::rgb(50, 50, 50),
            0.2,
            1.0,
            "population",
            Method::EqualInterval,
        )
        .unwrap()
    }

    #[test]
    fn test_labels_default_format() {
        let spec = spec();
        assert_eq!(spec.labels()[0], "1.00 - 2.80");
        assert_eq!(spec.labels()[4], "8.20 - 10.00");
        assert_eq!(spec.class_count(), 5);
    }

    #[test]
    fn test_labels_follow_format() {
        let spec = spec().with_label_format(LabelFormat::new(0, "–"));
        assert_eq!(spec.labels()[1], "3–5");
        assert_eq!(spec.label_format().precision, 0);
    }

    #[test]
    fn test_label_precision_is_capped() {
        assert_eq!(LabelFormat::new(25, " - ").precision, LabelFormat::MAX_PRECISION);
        let format = LabelFormat {
            precision: 40,
            separator: "/".to_string(),
        };
        assert_eq!(format.label(0.5, 1.0), "0.5000000000/1.0000000000");
    }

    #[test]
    fn test_zero_width_class_has_single_label() {
        let breaks = ClassBreaks::new(vec![1.0, 1.0, 2.0, 3.0]).unwrap();
        let labels = class_labels(&breaks, &LabelFormat::default());
        assert_eq!(labels, vec!["1.00", "1.00 - 2.00", "2.00 - 3.00"]);
    }

    #[test]
    fn test_negative_zero_label() {
        let format = LabelFormat::default();
        assert_eq!(format.label(-0.0, 1.0), "0.00 - 1.00");
    }

    #[test]
    fn test_build_rejects_invalid_parameters() {
        let colors = ColorScheme::Red.ramp(5, false, Interpolation::Endpoints);
        let build = |colors: Vec<Rgba>, width: f64, opacity: f64| {
            StyleSpec::build(breaks(), colors, Rgba::rgb(0, 0, 0), width, opacity, "f", Method::Quantile)
        };
        assert!(build(colors.clone(), 0.0, 0.0).is_ok());
        assert!(build(colors.clone(), 5.0, 1.0).is_ok());
        assert!(matches!(build(colors[..4].to_vec(), 0.2, 1.0), Err(ThematicError::Validation(_))));
        assert!(matches!(build(colors.clone(), 5.5, 1.0), Err(ThematicError::Validation(_))));
        assert!(matches!(build(colors.clone(), -0.1, 1.0), Err(ThematicError::Validation(_))));
        assert!(matches!(build(colors.clone(), 0.2, 1.2), Err(ThematicError::Validation(_))));
        assert!(matches!(build(colors, 0.2, f64::NAN), Err(ThematicError::Validation(_))));

        // Repeated breaks come only from quantile ties.
        let tied = ClassBreaks::new(vec![1.0, 1.0, 1.0, 2.0]).unwrap();
        let colors = ColorScheme::Red.ramp(3, false, Interpolation::Endpoints);
        let with_method = |method| {
            StyleSpec::build(tied.clone(), colors.clone(), Rgba::rgb(0, 0, 0), 0.2, 1.0, "f", method)
        };
        assert!(with_method(Method::Quantile).is_ok());
        for method in [Method::EqualInterval, Method::NaturalBreaks, Method::Pretty, Method::StdDev] {
            assert!(matches!(with_method(method), Err(ThematicError::Validation(_))), "{method}");
        }
    }

    #[test]
    fn test_feature_labels_are_validated() {
        let ok = spec().with_feature_labels(Some(LabelStyle::new("name"))).unwrap();
        assert_eq!(ok.feature_labels().map(|l| l.font_size), Some(10.0));

        let mut bad = LabelStyle::new("name");
        bad.font_size = 0.0;
        assert!(spec().with_feature_labels(Some(bad)).is_err());
        assert!(spec().with_feature_labels(Some(LabelStyle::new("  "))).is_err());
    }

    #[test]
    fn test_reclassify_uses_recorded_ramp() {
        let ramp = RampSource::new(ColorScheme::Green, true);
        let spec = spec().with_ramp(Some(ramp));
        let sample: Sample = (0..=20).map(f64::from).collect();

        let next = spec.reclassify(&sample, &ClassifyOptions::default()).unwrap();
        assert_eq!(next.breaks().as_slice(), &[0.0, 4.0, 8.0, 12.0, 16.0, 20.0]);
        assert_eq!(next.colors(), ramp.colors(5).as_slice());
        assert_eq!(next.labels()[0], "0.00 - 4.00");
        assert_eq!(next.ramp(), Some(&ramp));
        assert_eq!(next.field(), "population");
        // the original is untouched
        assert_eq!(spec.breaks(), &breaks());
    }

    #[test]
    fn test_reclassify_without_ramp_keeps_color_endpoints() {
        let spec = spec();
        let sample: Sample = (0..=20).map(f64::from).collect();
        let next = spec.reclassify(&sample, &ClassifyOptions::default()).unwrap();
        assert_eq!(next.colors().len(), 5);
        assert_eq!(next.colors().first(), spec.colors().first());
        assert_eq!(next.colors().last(), spec.colors().last());
    }

    #[test]
    fn test_reclassify_degenerate_sample_fails() {
        let sample = Sample::new([3.0, 3.0]);
        assert!(matches!(
            spec().reclassify(&sample, &ClassifyOptions::default()),
            Err(ThematicError::DegenerateRange { .. })
        ));
    }
}
