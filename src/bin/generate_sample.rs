use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

const REGIONS: usize = 120;

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Settlement types with (density mean, density spread, income mean) per km².
const KINDS: [(&str, f64, f64, f64); 3] = [
    ("rural", 40.0, 12.0, 28_000.0),
    ("suburban", 650.0, 150.0, 41_000.0),
    ("urban", 4_200.0, 900.0, 55_000.0),
];

struct Region {
    id: i64,
    name: String,
    kind: &'static str,
    area_km2: f64,
    population: Option<i64>,
    density: Option<f64>,
    median_income: Option<f64>,
    growth_pct: f64,
}

fn generate_regions(rng: &mut SimpleRng) -> Vec<Region> {
    (0..REGIONS)
        .map(|i| {
            // Roughly 60% rural, 30% suburban, 10% urban.
            let roll = rng.next_f64();
            let (kind, density_mu, density_sigma, income_mu) = match roll {
                r if r < 0.6 => KINDS[0],
                r if r < 0.9 => KINDS[1],
                _ => KINDS[2],
            };
            let area_km2 = (rng.gauss(250.0, 80.0).abs() + 5.0).round();
            let density = rng.gauss(density_mu, density_sigma).max(1.0);
            let population = (density * area_km2).round() as i64;

            // Every 17th region has no census count, every 23rd no income survey.
            let population = (i % 17 != 5).then_some(population);
            let median_income = (i % 23 != 11).then(|| rng.gauss(income_mu, 4_000.0).round());

            Region {
                id: i as i64,
                name: format!("{kind}-{i:03}"),
                kind,
                area_km2,
                population,
                density: population.map(|p| p as f64 / area_km2),
                median_income,
                growth_pct: (rng.gauss(0.4, 1.5) * 100.0).round() / 100.0,
            }
        })
        .collect()
}

fn write_parquet(regions: &[Region], path: &str) -> Result<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("region_id", DataType::Int64, false),
        Field::new("name", DataType::Utf8, false),
        Field::new("kind", DataType::Utf8, false),
        Field::new("area_km2", DataType::Float64, false),
        Field::new("population", DataType::Int64, true),
        Field::new("density", DataType::Float64, true),
        Field::new("median_income", DataType::Float64, true),
        Field::new("growth_pct", DataType::Float64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(Int64Array::from_iter_values(regions.iter().map(|r| r.id))),
            Arc::new(StringArray::from_iter_values(regions.iter().map(|r| r.name.as_str()))),
            Arc::new(StringArray::from_iter_values(regions.iter().map(|r| r.kind))),
            Arc::new(Float64Array::from_iter_values(regions.iter().map(|r| r.area_km2))),
            Arc::new(regions.iter().map(|r| r.population).collect::<Int64Array>()),
            Arc::new(regions.iter().map(|r| r.density).collect::<Float64Array>()),
            Arc::new(regions.iter().map(|r| r.median_income).collect::<Float64Array>()),
            Arc::new(Float64Array::from_iter_values(regions.iter().map(|r| r.growth_pct))),
        ],
    )
    .context("building record batch")?;

    let file = std::fs::File::create(path).with_context(|| format!("creating {path}"))?;
    let mut writer = ArrowWriter::try_new(file, schema, None).context("creating parquet writer")?;
    writer.write(&batch).context("writing batch")?;
    writer.close().context("closing parquet writer")?;
    Ok(())
}

fn write_csv(regions: &[Region], path: &str) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).with_context(|| format!("creating {path}"))?;
    writer.write_record([
        "region_id",
        "name",
        "kind",
        "area_km2",
        "population",
        "density",
        "median_income",
        "growth_pct",
    ])?;
    let opt = |v: Option<String>| v.unwrap_or_default();
    for r in regions {
        writer.write_record([
            r.id.to_string(),
            r.name.clone(),
            r.kind.to_string(),
            r.area_km2.to_string(),
            opt(r.population.map(|p| p.to_string())),
            opt(r.density.map(|d| format!("{d:.3}"))),
            opt(r.median_income.map(|m| m.to_string())),
            r.growth_pct.to_string(),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let mut rng = SimpleRng::new(42);
    let regions = generate_regions(&mut rng);

    let parquet_path = "sample_regions.parquet";
    let csv_path = "sample_regions.csv";
    write_parquet(&regions, parquet_path)?;
    write_csv(&regions, csv_path)?;

    let missing = regions.iter().filter(|r| r.population.is_none()).count();
    println!(
        "Wrote {} regions ({missing} without population) to {parquet_path} and {csv_path}",
        regions.len()
    );
    Ok(())
}
