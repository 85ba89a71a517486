/// Classification: numeric sample → ordered class breaks.
///
/// ```text
///   Sample ──classifier_for──▶ method actually used (+ Substitution)
///     │
///     ▼
///   methods / jenks  ──▶ raw breaks ──ClassBreaks::new──▶ validated breaks
///     │
///     ▼
///   goodness  (within-class SS, GVF, class counts)
/// ```

pub mod goodness;
#[cfg(feature = "natural-breaks")]
mod jenks;
mod methods;

#[cfg(test)]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::data::Sample;
use crate::error::{Result, ThematicError};

/// Fewest classes a classification may have.
pub const MIN_CLASSES: usize = 2;
/// Most classes a classification may have.
pub const MAX_CLASSES: usize = 15;

// ---------------------------------------------------------------------------
// Method
// ---------------------------------------------------------------------------

/// Classification method tag, persisted in snake_case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Method {
    EqualInterval,
    #[default]
    Quantile,
    NaturalBreaks,
    Pretty,
    StdDev,
}

impl Method {
    pub const ALL: [Method; 5] = [
        Method::EqualInterval,
        Method::Quantile,
        Method::NaturalBreaks,
        Method::Pretty,
        Method::StdDev,
    ];

    /// Human-readable name.
    pub fn name(&self) -> &'static str {
        match self {
            Method::EqualInterval => "Equal Intervals",
            Method::Quantile => "Quantiles",
            Method::NaturalBreaks => "Natural Breaks (Jenks)",
            Method::Pretty => "Pretty Breaks",
            Method::StdDev => "Standard Deviation",
        }
    }

    /// Stable machine tag, identical to the serialized form.
    pub fn tag(&self) -> &'static str {
        match self {
            Method::EqualInterval => "equal_interval",
            Method::Quantile => "quantile",
            Method::NaturalBreaks => "natural_breaks",
            Method::Pretty => "pretty",
            Method::StdDev => "std_dev",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Method {
    type Err = ThematicError;

    /// Accepts tags, display names and a few short aliases, ignoring case and punctuation.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();
        let method = match key.as_str() {
            "equalinterval" | "equalintervals" | "equal" => Method::EqualInterval,
            "quantile" | "quantiles" => Method::Quantile,
            "naturalbreaks" | "naturalbreaksjenks" | "jenks" => Method::NaturalBreaks,
            "pretty" | "prettybreaks" => Method::Pretty,
            "stddev" | "standarddeviation" => Method::StdDev,
            _ => {
                return Err(ThematicError::Validation(format!(
                    "unknown classification method '{s}'"
                )))
            }
        };
        Ok(method)
    }
}

// ---------------------------------------------------------------------------
// ClassBreaks
// ---------------------------------------------------------------------------

/// Ordered class boundaries `b0 <= b1 <= ... <= bk`.
///
/// Class `i` is `[b(i), b(i+1))`, the last class is closed on both ends.
/// Construction guarantees finite values, non-decreasing order, `b0 < bk`
/// and between [`MIN_CLASSES`] and [`MAX_CLASSES`] classes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct ClassBreaks(Vec<f64>);

impl ClassBreaks {
    pub fn new(values: Vec<f64>) -> Result<Self> {
        let classes = values.len().saturating_sub(1);
        if !(MIN_CLASSES..=MAX_CLASSES).contains(&classes) {
            return Err(ThematicError::Validation(format!(
                "{} breaks give {classes} classes, expected {MIN_CLASSES}..={MAX_CLASSES}",
                values.len()
            )));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(ThematicError::Validation(format!(
                "break {bad} is not finite"
            )));
        }
        if let Some(w) = values.windows(2).find(|w| w[1] < w[0]) {
            return Err(ThematicError::Validation(format!(
                "breaks must not decrease ({} follows {})",
                w[1], w[0]
            )));
        }
        if values[0] >= values[classes] {
            return Err(ThematicError::Validation(format!(
                "breaks span an empty range [{}, {}]",
                values[0], values[classes]
            )));
        }
        Ok(ClassBreaks(values))
    }

    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    /// Number of classes (`len - 1`).
    pub fn class_count(&self) -> usize {
        self.0.len() - 1
    }

    pub fn min(&self) -> f64 {
        self.0[0]
    }

    pub fn max(&self) -> f64 {
        self.0[self.0.len() - 1]
    }

    /// Whether every break is strictly greater than the previous one.
    pub fn is_strict(&self) -> bool {
        self.0.windows(2).all(|w| w[0] < w[1])
    }

    /// `(lower, upper)` bounds of class `i`.
    pub fn interval(&self, i: usize) -> Option<(f64, f64)> {
        Some((*self.0.get(i)?, *self.0.get(i + 1)?))
    }

    pub fn intervals(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.0.windows(2).map(|w| (w[0], w[1]))
    }

    /// Index of the class holding `value`, `None` outside `[min, max]`.
    pub fn class_of(&self, value: f64) -> Option<usize> {
        if !(self.min()..=self.max()).contains(&value) {
            return None;
        }
        let interior = &self.0[1..self.class_count()];
        Some(interior.partition_point(|&b| b <= value))
    }
}

impl TryFrom<Vec<f64>> for ClassBreaks {
    type Error = ThematicError;

    fn try_from(values: Vec<f64>) -> Result<Self> {
        ClassBreaks::new(values)
    }
}

impl From<ClassBreaks> for Vec<f64> {
    fn from(breaks: ClassBreaks) -> Self {
        breaks.0
    }
}

// ---------------------------------------------------------------------------
// Classification result
// ---------------------------------------------------------------------------

/// Record that the requested method could not run and another one was used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Substitution {
    pub requested: Method,
    pub used: Method,
    pub reason: String,
}

/// Breaks together with how they were obtained.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    pub breaks: ClassBreaks,
    /// The method that produced `breaks`.
    pub method: Method,
    /// Class count asked for; Pretty and Natural Breaks may return another.
    pub requested_classes: usize,
    pub substitution: Option<Substitution>,
}

impl Classification {
    pub fn class_count(&self) -> usize {
        self.breaks.class_count()
    }
}

/// Tunables of the classifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifyOptions {
    /// Natural Breaks is refused above this many distinct values.
    pub natural_breaks_limit: usize,
}

impl Default for ClassifyOptions {
    fn default() -> Self {
        Self {
            natural_breaks_limit: 100_000,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Whether `method` can classify `sample` in this build.
///
/// Returns the method itself when available and `UnsupportedMethod`
/// otherwise; the caller decides on a substitute.
pub fn classifier_for(method: Method, sample: &Sample, options: &ClassifyOptions) -> Result<Method> {
    if method != Method::NaturalBreaks {
        return Ok(method);
    }
    if !cfg!(feature = "natural-breaks") {
        return Err(ThematicError::UnsupportedMethod {
            method,
            reason: "built without the natural-breaks feature".to_string(),
        });
    }
    let distinct = sample.distinct_count();
    if distinct > options.natural_breaks_limit {
        return Err(ThematicError::UnsupportedMethod {
            method,
            reason: format!(
                "{distinct} distinct values exceed the limit of {}",
                options.natural_breaks_limit
            ),
        });
    }
    Ok(method)
}

/// Classify `sample` into `k` classes with default options.
pub fn classify(sample: &Sample, k: usize, method: Method) -> Result<Classification> {
    classify_with(sample, k, method, &ClassifyOptions::default())
}

/// Classify `sample` into `k` classes.
///
/// An unavailable method is replaced by Quantiles and reported through
/// [`Classification::substitution`]; it never fails the call.
pub fn classify_with(
    sample: &Sample,
    k: usize,
    method: Method,
    options: &ClassifyOptions,
) -> Result<Classification> {
    if !(MIN_CLASSES..=MAX_CLASSES).contains(&k) {
        return Err(ThematicError::Validation(format!(
            "{method}: {k} classes requested, expected {MIN_CLASSES}..={MAX_CLASSES}"
        )));
    }
    let (min, max) = sample.require_range()?;

    let (used, substitution) = match classifier_for(method, sample, options) {
        Ok(m) => (m, None),
        Err(ThematicError::UnsupportedMethod { reason, .. }) => {
            log::warn!("{method} unavailable ({reason}); using {}", Method::Quantile);
            let substitution = Substitution {
                requested: method,
                used: Method::Quantile,
                reason,
            };
            (Method::Quantile, Some(substitution))
        }
        Err(e) => return Err(e),
    };

    let raw = match used {
        Method::EqualInterval => methods::equal_interval(min, max, k),
        Method::Quantile => methods::quantile(sample.sorted(), k),
        Method::NaturalBreaks => natural_breaks(sample, k)?,
        Method::Pretty => methods::pretty(min, max, k)?,
        Method::StdDev => methods::std_dev(sample, k)?,
    };

    let breaks = ClassBreaks::new(raw)
        .map_err(|e| ThematicError::Validation(format!("{used} with {k} classes: {e}")))?;
    // Only rank ties may collapse adjacent breaks.
    if used != Method::Quantile && !breaks.is_strict() {
        return Err(ThematicError::Validation(format!(
            "{used} with {k} classes produced repeated breaks {:?}",
            breaks.as_slice()
        )));
    }

    log::debug!(
        "{used}: {} values into {} classes, breaks {:?}",
        sample.len(),
        breaks.class_count(),
        breaks.as_slice()
    );
    Ok(Classification {
        breaks,
        method: used,
        requested_classes: k,
        substitution,
    })
}

#[cfg(feature = "natural-breaks")]
fn natural_breaks(sample: &Sample, k: usize) -> Result<Vec<f64>> {
    Ok(jenks::natural_breaks(&sample.distinct(), k))
}

#[cfg(not(feature = "natural-breaks"))]
fn natural_breaks(_sample: &Sample, _k: usize) -> Result<Vec<f64>> {
    Err(ThematicError::UnsupportedMethod {
        method: Method::NaturalBreaks,
        reason: "built without the natural-breaks feature".to_string(),
    })
}
