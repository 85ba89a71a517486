use crate::data::Sample;
use crate::error::{Result, ThematicError};

use super::{MAX_CLASSES, MIN_CLASSES};

// ---------------------------------------------------------------------------
// Equal intervals
// ---------------------------------------------------------------------------

/// `min + i * (max - min) / k`, the last break pinned to `max`.
pub(super) fn equal_interval(min: f64, max: f64, k: usize) -> Vec<f64> {
    let width = (max - min) / k as f64;
    (0..=k)
        .map(|i| if i == k { max } else { min + i as f64 * width })
        .collect()
}

// ---------------------------------------------------------------------------
// Quantiles
// ---------------------------------------------------------------------------

/// Break `i` is the value at 0-based rank `floor(i * n / k)`; the last break is the maximum.
///
/// Class `i` then covers ranks `floor(i*n/k) .. floor((i+1)*n/k)`, which is
/// `floor(n/k)` or `ceil(n/k)` observations when values are distinct.
pub(super) fn quantile(sorted: &[f64], k: usize) -> Vec<f64> {
    let n = sorted.len();
    (0..=k)
        .map(|i| if i == k { sorted[n - 1] } else { sorted[i * n / k] })
        .collect()
}

// ---------------------------------------------------------------------------
// Pretty breaks
// ---------------------------------------------------------------------------

const MANTISSAS: [f64; 4] = [1.0, 2.0, 2.5, 5.0];

/// Slack when snapping `value / step` to the step lattice.
const LATTICE_EPS: f64 = 1e-9;

/// A step of the form `mantissa × 10^exponent`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct NiceStep {
    mantissa_idx: usize,
    exponent: i32,
}

/// `x × 10^exponent`, dividing for negative exponents so `3 × 10^-1` is exactly `0.3`.
fn scale(x: f64, exponent: i32) -> f64 {
    if exponent >= 0 {
        x * 10f64.powi(exponent)
    } else {
        x / 10f64.powi(-exponent)
    }
}

impl NiceStep {
    /// The nice step closest to `raw`; ties go to the smaller step.
    pub(super) fn nearest(raw: f64) -> Self {
        let exponent = raw.log10().floor() as i32;
        let candidates = (0..MANTISSAS.len())
            .map(|mantissa_idx| NiceStep { mantissa_idx, exponent })
            .chain(std::iter::once(NiceStep {
                mantissa_idx: 0,
                exponent: exponent + 1,
            }));
        let mut best = NiceStep { mantissa_idx: 0, exponent };
        for candidate in candidates {
            if (candidate.value() - raw).abs() < (best.value() - raw).abs() {
                best = candidate;
            }
        }
        best
    }

    pub(super) fn value(&self) -> f64 {
        self.multiple(1.0)
    }

    /// `n` steps, computed without accumulating rounding error.
    fn multiple(&self, n: f64) -> f64 {
        scale(n * MANTISSAS[self.mantissa_idx], self.exponent)
    }

    fn larger(self) -> Self {
        if self.mantissa_idx + 1 < MANTISSAS.len() {
            NiceStep { mantissa_idx: self.mantissa_idx + 1, ..self }
        } else {
            NiceStep { mantissa_idx: 0, exponent: self.exponent + 1 }
        }
    }

    fn smaller(self) -> Self {
        if self.mantissa_idx > 0 {
            NiceStep { mantissa_idx: self.mantissa_idx - 1, ..self }
        } else {
            NiceStep { mantissa_idx: MANTISSAS.len() - 1, exponent: self.exponent - 1 }
        }
    }
}

/// Multiples of a nice step covering `[min, max]`, outer breaks clamped to the data.
///
/// The class count is `ceil(max/step) - floor(min/step)`; when it leaves
/// `MIN_CLASSES..=MAX_CLASSES` the neighbouring nice step is tried.
pub(super) fn pretty(min: f64, max: f64, k: usize) -> Result<Vec<f64>> {
    let mut step = NiceStep::nearest((max - min) / k as f64);

    for _ in 0..2 * MANTISSAS.len() {
        let lo = (min / step.value() + LATTICE_EPS).floor();
        let hi = (max / step.value() - LATTICE_EPS).ceil();
        let count = (hi - lo) as usize;
        if count > MAX_CLASSES {
            step = step.larger();
            continue;
        }
        if count < MIN_CLASSES {
            step = step.smaller();
            continue;
        }

        log::debug!("pretty step {} gives {count} classes (requested {k})", step.value());
        let mut breaks: Vec<f64> = (0..=count).map(|j| step.multiple(lo + j as f64)).collect();
        breaks[0] = min;
        breaks[count] = max;
        return Ok(breaks);
    }

    Err(ThematicError::Validation(format!(
        "no nice step yields {MIN_CLASSES}..={MAX_CLASSES} classes over [{min}, {max}]"
    )))
}

// ---------------------------------------------------------------------------
// Standard deviation
// ---------------------------------------------------------------------------

const MAX_HALVINGS: usize = 52;

/// Interior breaks at `mean + (i - k/2) * step` for `i = 1..k`, outer breaks at min and max.
///
/// Even `k` puts the mean on a break, odd `k` centres it in the middle class.
/// `step` starts at one population standard deviation and is halved until
/// every interior break lies strictly inside `(min, max)`, so the result
/// always has exactly `k` classes.
pub(super) fn std_dev(sample: &Sample, k: usize) -> Result<Vec<f64>> {
    let (min, max) = sample.require_range()?;
    let (Some(mean), Some(sigma)) = (sample.mean(), sample.std_dev()) else {
        return Err(ThematicError::InvalidInput("empty sample".to_string()));
    };
    let half = k as f64 / 2.0;

    let mut step = sigma;
    for halvings in 0..=MAX_HALVINGS {
        let interior: Vec<f64> = (1..k).map(|i| mean + (i as f64 - half) * step).collect();
        let inside = interior.first().is_some_and(|&b| b > min)
            && interior.last().is_some_and(|&b| b < max)
            && interior.windows(2).all(|w| w[0] < w[1]);
        if inside {
            log::debug!("std dev step = sigma / 2^{halvings} (sigma = {sigma})");
            let mut breaks = Vec::with_capacity(k + 1);
            breaks.push(min);
            breaks.extend(interior);
            breaks.push(max);
            return Ok(breaks);
        }
        step /= 2.0;
    }

    Err(ThematicError::Validation(format!(
        "standard deviation breaks for {k} classes do not fit inside [{min}, {max}]"
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nearest_nice_step() {
        assert_eq!(NiceStep::nearest(1.8).value(), 2.0);
        assert_eq!(NiceStep::nearest(0.7).value(), 0.5);
        assert_eq!(NiceStep::nearest(3.0).value(), 2.5);
        assert_eq!(NiceStep::nearest(8.0).value(), 10.0);
        assert_eq!(NiceStep::nearest(420.0).value(), 500.0);
        assert_eq!(NiceStep::nearest(0.03).value(), 0.025);
    }

    #[test]
    fn test_step_ladder_neighbours() {
        let step = NiceStep::nearest(5.0);
        assert_eq!(step.larger().value(), 10.0);
        assert_eq!(step.smaller().value(), 2.5);
        assert_eq!(NiceStep::nearest(1.0).smaller().value(), 0.5);
    }

    #[test]
    fn test_negative_exponents_are_exact() {
        let step = NiceStep::nearest(0.1);
        assert_eq!(step.multiple(3.0), 0.3);
    }

    #[test]
    fn test_quantile_ranks() {
        let sorted: Vec<f64> = (1..=10).map(f64::from).collect();
        assert_eq!(quantile(&sorted, 5), vec![1.0, 3.0, 5.0, 7.0, 9.0, 10.0]);
        assert_eq!(quantile(&sorted, 3), vec![1.0, 4.0, 7.0, 10.0]);
    }
}
