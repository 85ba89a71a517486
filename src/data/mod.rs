/// Data layer: attribute tables, loading, and sample extraction.
///
/// Architecture:
/// ```text
///  .parquet / .json / .csv
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  parse file → AttributeTable
///   └──────────┘
///        │
///        ▼
///   ┌────────────────┐
///   │ AttributeTable │  Vec<Feature>, column index
///   └────────────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  filter   │  split one field into valid values / missing features
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │  Sample   │  sorted finite values + descriptive statistics
///   └──────────┘
/// ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod sample;

pub use filter::{FieldSplit, split_field};
pub use model::{AttributeTable, Feature, FieldValue};
pub use sample::{Sample, SampleStats};
