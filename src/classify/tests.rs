//! Unit tests for the classify module

use super::goodness::{class_counts, gvf, within_class_ss};
use super::*;

/// Deterministic xorshift generator for reproducible samples.
struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_f64(&mut self) -> f64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        (x >> 11) as f64 / (1u64 << 53) as f64
    }
}

fn one_to_ten() -> Sample {
    (1..=10).map(f64::from).collect()
}

fn random_sample(n: usize, seed: u64) -> Sample {
    let mut rng = SimpleRng::new(seed);
    (0..n).map(|_| (rng.next_f64() * 1000.0).powf(1.5)).collect()
}

fn assert_close(actual: &[f64], expected: &[f64]) {
    assert_eq!(actual.len(), expected.len(), "{actual:?} vs {expected:?}");
    for (a, e) in actual.iter().zip(expected) {
        assert!((a - e).abs() < 1e-9, "{actual:?} vs {expected:?}");
    }
}

/// Smallest within-class SS over every split of `sorted` into `k` contiguous groups.
fn brute_force_ss(sorted: &[f64], k: usize) -> f64 {
    fn ss(values: &[f64]) -> f64 {
        let mean = values.iter().sum::<f64>() / values.len() as f64;
        values.iter().map(|x| (x - mean).powi(2)).sum()
    }
    if k == 1 {
        return ss(sorted);
    }
    (1..=sorted.len() - (k - 1))
        .map(|cut| ss(&sorted[..cut]) + brute_force_ss(&sorted[cut..], k - 1))
        .fold(f64::INFINITY, f64::min)
}

// =============================================================================
// Concrete scenarios
// =============================================================================

#[test]
fn test_equal_interval_one_to_ten() {
    let c = classify(&one_to_ten(), 5, Method::EqualInterval).unwrap();
    assert_close(c.breaks.as_slice(), &[1.0, 2.8, 4.6, 6.4, 8.2, 10.0]);
    assert_eq!(c.method, Method::EqualInterval);
    assert!(c.substitution.is_none());
}

#[test]
fn test_quantile_one_to_ten() {
    let c = classify(&one_to_ten(), 5, Method::Quantile).unwrap();
    assert_eq!(c.breaks.as_slice(), &[1.0, 3.0, 5.0, 7.0, 9.0, 10.0]);
}

#[test]
fn test_pretty_one_to_ten() {
    let c = classify(&one_to_ten(), 5, Method::Pretty).unwrap();
    assert_eq!(c.breaks.as_slice(), &[1.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
}

#[test]
fn test_pretty_count_may_differ_from_request() {
    let sample = Sample::new([0.3, 1.7, 2.2, 9.4]);
    let c = classify(&sample, 4, Method::Pretty).unwrap();
    // step 2.5: multiples 0, 2.5, 5, 7.5, 10 clamped to the data.
    assert_eq!(c.breaks.as_slice(), &[0.3, 2.5, 5.0, 7.5, 9.4]);

    let c = classify(&Sample::new([0.0, 9.0]), 4, Method::Pretty).unwrap();
    // step 2: 0, 2, 4, 6, 8, 10 → five classes for four requested.
    assert_eq!(c.class_count(), 5);
    assert_eq!(c.requested_classes, 4);
    assert_eq!(c.breaks.as_slice(), &[0.0, 2.0, 4.0, 6.0, 8.0, 9.0]);
}

#[test]
fn test_std_dev_odd_centres_mean_in_middle_class() {
    let sample = one_to_ten();
    let sigma = 8.25f64.sqrt();
    let c = classify(&sample, 5, Method::StdDev).unwrap();
    assert_close(
        c.breaks.as_slice(),
        &[
            1.0,
            5.5 - 1.5 * sigma,
            5.5 - 0.5 * sigma,
            5.5 + 0.5 * sigma,
            5.5 + 1.5 * sigma,
            10.0,
        ],
    );
}

#[test]
fn test_std_dev_even_puts_mean_on_break() {
    let c = classify(&one_to_ten(), 4, Method::StdDev).unwrap();
    assert_eq!(c.class_count(), 4);
    assert_eq!(c.breaks.as_slice()[2], 5.5);
}

#[test]
fn test_std_dev_step_shrinks_for_skewed_data() {
    let mut values = vec![1.0; 9];
    values.push(100.0);
    let sample = Sample::new(values);
    let mean = sample.mean().unwrap();
    let sigma = sample.std_dev().unwrap();

    let c = classify(&sample, 4, Method::StdDev).unwrap();
    let b = c.breaks.as_slice();
    assert_eq!(b.len(), 5);
    assert!(c.breaks.is_strict());
    assert_eq!(b[2], mean);
    // sigma and sigma/2 reach below the minimum, sigma/4 fits.
    assert!((b[3] - (mean + sigma / 4.0)).abs() < 1e-9);
    assert!((b[1] + b[3] - 2.0 * mean).abs() < 1e-9);
}

#[test]
fn test_natural_breaks_finds_clusters() {
    let sample = Sample::new([1.0, 2.0, 3.0, 10.0, 11.0, 12.0, 30.0, 31.0]);
    let c = classify(&sample, 3, Method::NaturalBreaks).unwrap();
    assert_eq!(c.method, Method::NaturalBreaks);
    assert_eq!(c.breaks.as_slice(), &[1.0, 6.5, 21.0, 31.0]);
    assert_eq!(class_counts(&sample, &c.breaks), vec![3, 3, 2]);
}

// =============================================================================
// Invariants
// =============================================================================

#[test]
fn test_all_methods_respect_break_invariants() {
    for seed in 1..=5 {
        let sample = random_sample(200, seed);
        let (min, max) = sample.require_range().unwrap();
        for method in Method::ALL {
            for k in MIN_CLASSES..=MAX_CLASSES {
                let c = classify(&sample, k, method).unwrap();
                let b = c.breaks.as_slice();
                assert_eq!(b[0], min, "{method} k={k}");
                assert_eq!(b[b.len() - 1], max, "{method} k={k}");
                assert!(c.breaks.is_strict(), "{method} k={k}: {b:?}");
                if method != Method::Pretty {
                    assert_eq!(c.class_count(), k, "{method} k={k}");
                }
            }
        }
    }
}

#[test]
fn test_classification_ignores_input_order() {
    let forward = random_sample(120, 7);
    let mut values = forward.sorted().to_vec();
    values.reverse();
    values.swap(3, 90);
    let shuffled = Sample::new(values);
    for method in Method::ALL {
        let a = classify(&forward, 6, method).unwrap();
        let b = classify(&shuffled, 6, method).unwrap();
        assert_eq!(a, b, "{method}");
        assert_eq!(a, classify(&forward, 6, method).unwrap(), "{method}");
    }
}

#[test]
fn test_equal_interval_widths_are_equal() {
    let sample = random_sample(50, 11);
    let (min, max) = sample.require_range().unwrap();
    let c = classify(&sample, 7, Method::EqualInterval).unwrap();
    let width = (max - min) / 7.0;
    for (lo, hi) in c.breaks.intervals() {
        assert!(((hi - lo) - width).abs() < 1e-9 * width.max(1.0));
    }
}

#[test]
fn test_quantile_classes_are_balanced() {
    for (n, k) in [(37, 5), (100, 7), (10, 3), (16, 15)] {
        let sample = random_sample(n, n as u64);
        assert_eq!(sample.distinct_count(), n);
        let c = classify(&sample, k, Method::Quantile).unwrap();
        let counts = class_counts(&sample, &c.breaks);
        assert_eq!(counts.iter().sum::<usize>(), n);
        for count in counts {
            assert!(count == n / k || count == n.div_ceil(k), "n={n} k={k} count={count}");
        }
    }
}

#[test]
fn test_quantile_ties_collapse_breaks() {
    let sample = Sample::new([1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0]);
    let c = classify(&sample, 4, Method::Quantile).unwrap();
    assert_eq!(c.breaks.as_slice(), &[1.0, 1.0, 1.0, 2.0, 3.0]);
    assert!(!c.breaks.is_strict());
    assert_eq!(class_counts(&sample, &c.breaks), vec![0, 0, 6, 2]);
}

#[test]
fn test_natural_breaks_is_optimal() {
    for seed in 1..=6 {
        let sample = random_sample(8, seed);
        for k in 2..=4 {
            let c = classify(&sample, k, Method::NaturalBreaks).unwrap();
            let ss = within_class_ss(&sample, &c.breaks);
            let best = brute_force_ss(sample.sorted(), k);
            assert!((ss - best).abs() < 1e-6 * best.max(1.0), "seed {seed} k {k}: {ss} vs {best}");
        }
    }
}

#[test]
fn test_natural_breaks_beats_equal_and_quantile() {
    for seed in 1..=4 {
        let sample = random_sample(500, seed);
        for k in [3, 5, 8] {
            let jenks = classify(&sample, k, Method::NaturalBreaks).unwrap();
            let ss = within_class_ss(&sample, &jenks.breaks);
            for other in [Method::EqualInterval, Method::Quantile] {
                let c = classify(&sample, k, other).unwrap();
                let other_ss = within_class_ss(&sample, &c.breaks);
                assert!(ss <= other_ss * (1.0 + 1e-9), "{other} k={k}: {ss} > {other_ss}");
            }
            assert!(gvf(&sample, &jenks.breaks) > 0.0);
        }
    }
}

#[test]
fn test_natural_breaks_with_few_distinct_values() {
    let sample = Sample::new([1.0, 1.0, 2.0, 2.0, 9.0]);
    let c = classify(&sample, 5, Method::NaturalBreaks).unwrap();
    assert_eq!(c.class_count(), 3);
    assert_eq!(c.breaks.as_slice(), &[1.0, 1.5, 5.5, 9.0]);
}

// =============================================================================
// Errors and substitution
// =============================================================================

#[test]
fn test_degenerate_sample_fails() {
    let sample = Sample::new([5.0, 5.0, 5.0, 5.0]);
    for method in Method::ALL {
        assert!(matches!(
            classify(&sample, 5, method),
            Err(ThematicError::DegenerateRange { count: 4, .. })
        ));
    }
}

#[test]
fn test_empty_sample_fails() {
    let sample = Sample::from_optional([None, Some(f64::NAN)]);
    assert!(matches!(
        classify(&sample, 3, Method::Quantile),
        Err(ThematicError::InvalidInput(_))
    ));
}

#[test]
fn test_class_count_out_of_range() {
    for k in [0, 1, 16] {
        let err = classify(&one_to_ten(), k, Method::EqualInterval).unwrap_err();
        assert!(matches!(err, ThematicError::Validation(_)));
        assert!(err.to_string().contains("Equal Intervals"));
    }
}

#[test]
fn test_natural_breaks_falls_back_to_quantiles() {
    let sample = random_sample(40, 3);
    let options = ClassifyOptions {
        natural_breaks_limit: 10,
    };
    assert!(matches!(
        classifier_for(Method::NaturalBreaks, &sample, &options),
        Err(ThematicError::UnsupportedMethod { method: Method::NaturalBreaks, .. })
    ));

    let c = classify_with(&sample, 4, Method::NaturalBreaks, &options).unwrap();
    assert_eq!(c.method, Method::Quantile);
    let substitution = c.substitution.as_ref().unwrap();
    assert_eq!(substitution.requested, Method::NaturalBreaks);
    assert_eq!(substitution.used, Method::Quantile);
    assert!(substitution.reason.contains("40 distinct values"));
    assert_eq!(c.breaks, classify(&sample, 4, Method::Quantile).unwrap().breaks);
}

#[test]
fn test_other_methods_always_available() {
    let sample = one_to_ten();
    let options = ClassifyOptions {
        natural_breaks_limit: 0,
    };
    for method in [Method::EqualInterval, Method::Quantile, Method::Pretty, Method::StdDev] {
        assert_eq!(classifier_for(method, &sample, &options).unwrap(), method);
    }
}

// =============================================================================
// ClassBreaks and Method
// =============================================================================

#[test]
fn test_class_breaks_validation() {
    assert!(ClassBreaks::new(vec![1.0, 2.0, 3.0]).is_ok());
    assert!(ClassBreaks::new(vec![1.0, 2.0]).is_err());
    assert!(ClassBreaks::new(vec![3.0, 2.0, 1.0]).is_err());
    assert!(ClassBreaks::new(vec![1.0, f64::NAN, 3.0]).is_err());
    assert!(ClassBreaks::new(vec![2.0, 2.0, 2.0]).is_err());
    assert!(ClassBreaks::new((0..=16).map(f64::from).collect()).is_err());
}

#[test]
fn test_class_of_half_open_intervals() {
    let breaks = ClassBreaks::new(vec![0.0, 10.0, 20.0, 30.0]).unwrap();
    assert_eq!(breaks.class_of(0.0), Some(0));
    assert_eq!(breaks.class_of(9.999), Some(0));
    assert_eq!(breaks.class_of(10.0), Some(1));
    assert_eq!(breaks.class_of(30.0), Some(2));
    assert_eq!(breaks.class_of(30.1), None);
    assert_eq!(breaks.class_of(-1.0), None);
    assert_eq!(breaks.class_of(f64::NAN), None);
}

#[test]
fn test_class_breaks_deserialize_validates() {
    let ok: ClassBreaks = serde_json::from_str("[1.0, 2.5, 4.0]").unwrap();
    assert_eq!(ok.class_count(), 2);
    assert!(serde_json::from_str::<ClassBreaks>("[4.0, 2.5, 1.0]").is_err());
}

#[test]
fn test_method_parsing() {
    for method in Method::ALL {
        assert_eq!(method.tag().parse::<Method>().unwrap(), method);
        assert_eq!(method.name().parse::<Method>().unwrap(), method);
        assert_eq!(
            serde_json::to_string(&method).unwrap(),
            format!("\"{}\"", method.tag())
        );
    }
    assert_eq!("jenks".parse::<Method>().unwrap(), Method::NaturalBreaks);
    assert!("kmeans".parse::<Method>().is_err());
}
