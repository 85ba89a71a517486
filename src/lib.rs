//! Choropleth classification and styling.
//!
//! ```text
//!   Sample ──classify──▶ ClassBreaks ──┐
//!                                      ├──▶ StyleSpec ──┬──▶ render::build ──▶ RenderSpec
//!   ColorScheme ──ramp──▶ Vec<Rgba> ───┘                └──▶ PresetStore (JSON files)
//! ```
//!
//! Everything except [`preset`] and [`data::loader`] is pure computation.

pub mod classify;
pub mod color;
pub mod config;
pub mod data;
pub mod error;
pub mod preset;
pub mod render;
pub mod session;
pub mod style;

pub use classify::{
    classifier_for, classify, classify_with, ClassBreaks, Classification, ClassifyOptions, Method,
    Substitution,
};
pub use color::{generate, generate_multi, ColorScheme, Interpolation, Rgba};
pub use config::StyleParams;
pub use data::{Sample, SampleStats};
pub use error::{Result, ThematicError};
pub use preset::PresetStore;
pub use render::{RenderClass, RenderSpec};
pub use session::StyleSession;
pub use style::{LabelFormat, LabelStyle, RampSource, StyleSpec};
