//! Common test utilities
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use thematic_map::{
    classify, ColorScheme, LabelFormat, LabelStyle, Method, RampSource, Rgba, Sample, StyleSpec,
};

/// Simple pseudo-random number generator (xorshift)
pub struct SimpleRng {
    state: u64,
}

impl SimpleRng {
    pub fn new(seed: u64) -> Self {
        Self {
            state: if seed == 0 { 1 } else { seed },
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }

    /// Uniform in `[0, 1)`.
    pub fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}

/// `n` values drawn from three well separated clusters.
pub fn clustered_values(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = SimpleRng::new(seed);
    (0..n)
        .map(|i| {
            let centre = [10.0, 1_000.0, 100_000.0][i % 3];
            centre * (0.99 + 0.02 * rng.next_f64())
        })
        .collect()
}

/// Skewed values, like population counts.
pub fn skewed_values(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = SimpleRng::new(seed);
    (0..n).map(|_| (rng.next_f64() * 8.0).exp()).collect()
}

/// A fully populated style: ramp, label format and feature labels.
pub fn sample_spec() -> StyleSpec {
    let sample = Sample::new(skewed_values(300, 99));
    let classification = classify(&sample, 6, Method::NaturalBreaks).unwrap();
    let ramp = RampSource::new(ColorScheme::Custom {
        start: Rgba::new(10, 20, 30, 200),
        end: Rgba::rgb(250, 128, 0),
    }, true);
    let mut labels = LabelStyle::new("name");
    labels.font_size = 8.5;
    labels.background = Some(Rgba::new(255, 255, 255, 180));

    StyleSpec::build(
        classification.breaks,
        ramp.colors(6),
        Rgba::rgb(50, 50, 50),
        0.26,
        0.85,
        "population",
        classification.method,
    )
    .unwrap()
    .with_label_format(LabelFormat::new(1, " to "))
    .with_ramp(Some(ramp))
    .with_feature_labels(Some(labels))
    .unwrap()
}

/// Write a small regions table as CSV and return its path.
///
/// Region `r03` has no population and `r07` an unparseable one.
pub fn write_regions_csv(dir: &Path) -> PathBuf {
    let path = dir.join("regions.csv");
    let mut text = String::from("name,population,area,kind\n");
    for i in 1..=10 {
        let population = match i {
            3 => String::new(),
            7 => "n/a".to_string(),
            _ => (i * 100).to_string(),
        };
        text.push_str(&format!("r{i:02},{population},{}.5,rural\n", i * 3));
    }
    std::fs::write(&path, text).unwrap();
    path
}
