//! Measures for comparing classifications of the same sample.

use crate::data::Sample;

use super::ClassBreaks;

/// Number of sample values falling in each class.
pub fn class_counts(sample: &Sample, breaks: &ClassBreaks) -> Vec<usize> {
    let mut counts = vec![0; breaks.class_count()];
    for &v in sample.sorted() {
        if let Some(i) = breaks.class_of(v) {
            counts[i] += 1;
        }
    }
    counts
}

fn squared_deviations(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    values.iter().map(|&x| (x - mean).powi(2)).sum()
}

/// Sum over classes of squared deviations from the class mean.
///
/// Values outside `[breaks.min(), breaks.max()]` are ignored.
pub fn within_class_ss(sample: &Sample, breaks: &ClassBreaks) -> f64 {
    let mut groups: Vec<Vec<f64>> = vec![Vec::new(); breaks.class_count()];
    for &v in sample.sorted() {
        if let Some(i) = breaks.class_of(v) {
            groups[i].push(v);
        }
    }
    groups.iter().map(|g| squared_deviations(g)).sum()
}

/// Squared deviations of the whole sample from its mean.
pub fn total_ss(sample: &Sample) -> f64 {
    squared_deviations(sample.sorted())
}

/// Goodness of variance fit, `1 - within / total`; 1 is a perfect fit.
pub fn gvf(sample: &Sample, breaks: &ClassBreaks) -> f64 {
    let total = total_ss(sample);
    if total == 0.0 {
        return 1.0;
    }
    1.0 - within_class_ss(sample, breaks) / total
}
