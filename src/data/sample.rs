use std::fmt;

use crate::error::{Result, ThematicError};

// ---------------------------------------------------------------------------
// Sample – the flat numeric observations of one field
// ---------------------------------------------------------------------------

/// Finite observations of one attribute, sorted ascending.
///
/// Missing and non-finite inputs are dropped on construction and only
/// counted, so every downstream computation sees clean data and is
/// independent of the input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sample {
    sorted: Vec<f64>,
    dropped: usize,
}

impl Sample {
    /// Build a sample from raw values, dropping NaN and infinities.
    pub fn new<I: IntoIterator<Item = f64>>(values: I) -> Self {
        Self::from_optional(values.into_iter().map(Some))
    }

    /// Build a sample from possibly missing values.
    pub fn from_optional<I: IntoIterator<Item = Option<f64>>>(values: I) -> Self {
        let mut dropped = 0;
        let mut sorted: Vec<f64> = values
            .into_iter()
            .filter_map(|v| match v {
                // `+ 0.0` folds -0.0 into 0.0 so both compare and sort alike.
                Some(x) if x.is_finite() => Some(x + 0.0),
                _ => {
                    dropped += 1;
                    None
                }
            })
            .collect();
        sorted.sort_by(f64::total_cmp);
        if dropped > 0 {
            log::debug!("sample dropped {dropped} missing or non-finite values");
        }
        Sample { sorted, dropped }
    }

    /// Valid values in ascending order.
    pub fn sorted(&self) -> &[f64] {
        &self.sorted
    }

    /// Number of valid values.
    pub fn len(&self) -> usize {
        self.sorted.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sorted.is_empty()
    }

    /// Number of inputs rejected as missing or non-finite.
    pub fn dropped(&self) -> usize {
        self.dropped
    }

    pub fn min(&self) -> Option<f64> {
        self.sorted.first().copied()
    }

    pub fn max(&self) -> Option<f64> {
        self.sorted.last().copied()
    }

    /// Number of distinct values.
    pub fn distinct_count(&self) -> usize {
        if self.sorted.is_empty() {
            return 0;
        }
        1 + self.sorted.windows(2).filter(|w| w[0] != w[1]).count()
    }

    /// Distinct values with their multiplicities, ascending.
    pub fn distinct(&self) -> Vec<(f64, usize)> {
        let mut out: Vec<(f64, usize)> = Vec::new();
        for &v in &self.sorted {
            match out.last_mut() {
                Some((last, count)) if *last == v => *count += 1,
                _ => out.push((v, 1)),
            }
        }
        out
    }

    /// Arithmetic mean, `None` when empty.
    pub fn mean(&self) -> Option<f64> {
        if self.sorted.is_empty() {
            return None;
        }
        Some(self.sorted.iter().sum::<f64>() / self.sorted.len() as f64)
    }

    /// Population standard deviation, `None` when empty.
    pub fn std_dev(&self) -> Option<f64> {
        let mean = self.mean()?;
        let n = self.sorted.len() as f64;
        let variance = self.sorted.iter().map(|&x| (x - mean).powi(2)).sum::<f64>() / n;
        Some(variance.sqrt())
    }

    /// Median (mean of the two middle values for even counts), `None` when empty.
    pub fn median(&self) -> Option<f64> {
        let n = self.sorted.len();
        if n == 0 {
            return None;
        }
        if n % 2 == 1 {
            Some(self.sorted[n / 2])
        } else {
            Some((self.sorted[n / 2 - 1] + self.sorted[n / 2]) / 2.0)
        }
    }

    /// The `(min, max)` range, rejecting empty and zero-width samples.
    pub fn require_range(&self) -> Result<(f64, f64)> {
        let (Some(min), Some(max)) = (self.min(), self.max()) else {
            return Err(ThematicError::InvalidInput(format!(
                "sample has no valid numeric values ({} dropped)",
                self.dropped
            )));
        };
        if min == max {
            return Err(ThematicError::DegenerateRange {
                value: min,
                count: self.len(),
            });
        }
        Ok((min, max))
    }

    /// Descriptive statistics of the valid values.
    pub fn stats(&self) -> Result<SampleStats> {
        let (Some(min), Some(max), Some(mean), Some(median), Some(std_dev)) = (
            self.min(),
            self.max(),
            self.mean(),
            self.median(),
            self.std_dev(),
        ) else {
            return Err(ThematicError::InvalidInput(
                "no valid numeric data to summarise".to_string(),
            ));
        };
        Ok(SampleStats {
            count: self.len(),
            dropped: self.dropped,
            min,
            max,
            mean,
            median,
            std_dev,
        })
    }
}

impl FromIterator<f64> for Sample {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        Sample::new(iter)
    }
}

// ---------------------------------------------------------------------------
// SampleStats
// ---------------------------------------------------------------------------

/// Summary shown before choosing a classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampleStats {
    pub count: usize,
    pub dropped: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
    pub std_dev: f64,
}

impl SampleStats {
    pub fn range(&self) -> f64 {
        self.max - self.min
    }
}

impl fmt::Display for SampleStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Count:   {} ({} without data)", self.count, self.dropped)?;
        writeln!(f, "Min:     {:.2}", self.min)?;
        writeln!(f, "Max:     {:.2}", self.max)?;
        writeln!(f, "Mean:    {:.2}", self.mean)?;
        writeln!(f, "Median:  {:.2}", self.median)?;
        writeln!(f, "Std Dev: {:.2}", self.std_dev)?;
        write!(f, "Range:   {:.2}", self.range())
    }
}
