use colored::*;

use thematic_map::{Classification, Rgba, SampleStats, StyleSpec};

pub(crate) fn print_error(msg: &str) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub(crate) fn print_warning(msg: &str) {
    eprintln!("{}: {}", "warning".yellow().bold(), msg);
}

/// A block of the color itself; plain spaces when color is disabled.
fn swatch(color: Rgba) -> ColoredString {
    "    ".on_truecolor(color.r, color.g, color.b)
}

pub(crate) fn print_stats(field: &str, stats: &SampleStats) {
    println!("{} {}", "Field:".bold(), field);
    println!("{stats}");
}

pub(crate) fn print_style_header(spec: &StyleSpec) {
    println!("{} {}", "Field:".bold(), spec.field());
    println!(
        "{} {} ({} classes)",
        "Method:".bold(),
        spec.method(),
        spec.class_count()
    );
    if let Some(ramp) = spec.ramp() {
        let order = if ramp.reversed { ", reversed" } else { "" };
        println!("{} {}{order}", "Colors:".bold(), ramp.scheme);
    }
    println!(
        "{} {} {:.1} mm, opacity {:.2}",
        "Border:".bold(),
        spec.border_color(),
        spec.border_width(),
        spec.opacity()
    );
    if let Some(labels) = spec.feature_labels() {
        let halo = labels
            .background
            .map(|c| format!(", halo {c}"))
            .unwrap_or_default();
        println!(
            "{} '{}' at {} pt in {}{halo}",
            "Labels:".bold(),
            labels.field,
            labels.font_size,
            labels.font_color
        );
    }
}

pub(crate) fn print_substitution(classification: &Classification) {
    if let Some(s) = &classification.substitution {
        print_warning(&format!("{} used instead of {}: {}", s.used, s.requested, s.reason));
    }
}

/// One line per class: swatch, hex color, interval label and optional count.
pub(crate) fn print_legend(spec: &StyleSpec, counts: Option<&[usize]>) {
    println!();
    println!("{}", "[Legend]".bold());
    let width = spec.labels().iter().map(String::len).max().unwrap_or(0);
    for (i, (color, label)) in spec.colors().iter().zip(spec.labels()).enumerate() {
        print!("  {} {}  {label:<width$}", swatch(*color), color.to_hex());
        match counts.and_then(|c| c.get(i)) {
            Some(n) => println!("  {n:>6}"),
            None => println!(),
        }
    }
}
