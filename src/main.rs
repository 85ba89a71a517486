mod output;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;

use thematic_map::classify::goodness::{class_counts, gvf};
use thematic_map::color::{CUSTOM_END, CUSTOM_START};
use thematic_map::config::{DEFAULT_STYLES_DIR, STYLES_DIR_ENV};
use thematic_map::data::loader::load_file;
use thematic_map::{
    render, ColorScheme, Interpolation, LabelFormat, LabelStyle, Method, PresetStore, Rgba,
    StyleSession,
};

use output::{
    print_error, print_legend, print_stats, print_style_header, print_substitution, print_warning,
};

#[derive(Parser)]
#[command(
    name = "thematic-map",
    version,
    about = "Classify a numeric attribute into choropleth classes, colors and reusable style presets",
    after_help = "Examples:
  thematic-map fields regions.csv                          List numeric fields
  thematic-map stats regions.parquet -f density            Describe one field
  thematic-map classify regions.csv -f density -m jenks -k 6
  thematic-map classify regions.csv -f income --scheme heat --reverse --save income_heat
  thematic-map presets show income_heat --json             Renderer input of a preset"
)]
struct Cli {
    /// Directory holding saved style presets
    #[arg(long, global = true, env = STYLES_DIR_ENV, default_value = DEFAULT_STYLES_DIR, value_name = "DIR")]
    styles_dir: PathBuf,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the numeric fields of an attribute table (CSV, JSON or Parquet)
    Fields {
        file: PathBuf,
    },

    /// Descriptive statistics of one field
    Stats {
        file: PathBuf,

        #[arg(short, long)]
        field: String,
    },

    /// Classify a field and print the legend
    Classify(ClassifyArgs),

    /// Manage saved style presets
    #[command(subcommand)]
    Presets(PresetCommand),
}

#[derive(Args)]
struct ClassifyArgs {
    file: PathBuf,

    /// Field to classify [default: first numeric field]
    #[arg(short, long)]
    field: Option<String>,

    /// equal_interval, quantile, natural_breaks (jenks), pretty or std_dev [default: quantile]
    #[arg(short, long)]
    method: Option<Method>,

    /// Number of classes, 2 to 15 [default: 5]
    #[arg(short = 'k', long)]
    classes: Option<usize>,

    /// Blue, Red, Green, Rainbow, Purple, Heat, Orange or Custom [default: Blue]
    #[arg(short, long)]
    scheme: Option<String>,

    /// First color of a custom ramp (implies --scheme custom)
    #[arg(long, value_name = "HEX")]
    start_color: Option<Rgba>,

    /// Last color of a custom ramp (implies --scheme custom)
    #[arg(long, value_name = "HEX")]
    end_color: Option<Rgba>,

    /// Reverse the color ramp
    #[arg(short, long)]
    reverse: bool,

    /// Interpolate through every color of the scheme, not just its ends
    #[arg(long)]
    multi_stop: bool,

    /// Outline color [default: #323232]
    #[arg(long, value_name = "HEX")]
    border_color: Option<Rgba>,

    /// Outline width in millimetres, 0 to 5 [default: 0.2]
    #[arg(long, value_name = "MM")]
    border_width: Option<f64>,

    /// Fill opacity, 0 to 1 [default: 1]
    #[arg(long)]
    opacity: Option<f64>,

    /// Decimals in legend labels [default: 2]
    #[arg(long)]
    precision: Option<usize>,

    /// Draw this field as a label on each feature
    #[arg(long, value_name = "FIELD")]
    label_field: Option<String>,

    /// Label font size in points [default: 10]
    #[arg(long, value_name = "PT", requires = "label_field")]
    label_size: Option<f64>,

    /// Label text color [default: #000000]
    #[arg(long, value_name = "HEX", requires = "label_field")]
    label_color: Option<Rgba>,

    /// Draw a halo of this color behind each label
    #[arg(long, value_name = "HEX", requires = "label_field")]
    label_halo: Option<Rgba>,

    /// Save the resulting style as a preset
    #[arg(long, value_name = "NAME")]
    save: Option<String>,

    /// Print the renderer input as JSON instead of a legend
    #[arg(long)]
    json: bool,
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List saved presets
    List,

    /// Print a saved preset
    Show {
        name: String,

        /// Print the renderer input as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a saved preset
    Remove { name: String },
}

fn session_for(file: &Path, styles_dir: &Path) -> Result<StyleSession> {
    let table = load_file(file)?;
    let mut session = StyleSession::new(PresetStore::new(styles_dir));
    session.set_table(table);
    Ok(session)
}

fn run_fields(file: &Path) -> Result<()> {
    let table = load_file(file)?;
    let fields = table.numeric_fields();
    if fields.is_empty() {
        print_warning(&format!("{} has no numeric fields", file.display()));
    }
    for field in fields {
        println!("{field}");
    }
    Ok(())
}

fn run_stats(file: &Path, field: &str, styles_dir: &Path) -> Result<()> {
    let mut session = session_for(file, styles_dir)?;
    session.set_field(field)?;
    let stats = session.stats()?;
    print_stats(field, &stats);
    Ok(())
}

/// Resolve the scheme flags; explicit endpoint colors make a custom scheme.
fn scheme_from_args(args: &ClassifyArgs) -> Result<Option<ColorScheme>> {
    if args.start_color.is_some() || args.end_color.is_some() {
        return Ok(Some(ColorScheme::Custom {
            start: args.start_color.unwrap_or(CUSTOM_START),
            end: args.end_color.unwrap_or(CUSTOM_END),
        }));
    }
    Ok(args
        .scheme
        .as_deref()
        .map(ColorScheme::from_name)
        .transpose()?)
}

fn run_classify(args: &ClassifyArgs, styles_dir: &Path) -> Result<()> {
    let mut session = session_for(&args.file, styles_dir)?;
    if let Some(field) = &args.field {
        session.set_field(field)?;
    }

    let params = &mut session.params;
    if let Some(method) = args.method {
        params.method = method;
    }
    if let Some(classes) = args.classes {
        params.classes = classes;
    }
    if let Some(scheme) = scheme_from_args(args)? {
        params.scheme = scheme;
    }
    params.reversed = args.reverse;
    if args.multi_stop {
        params.interpolation = Interpolation::Stops;
    }
    if let Some(color) = args.border_color {
        params.border_color = color;
    }
    if let Some(width) = args.border_width {
        params.border_width = width;
    }
    if let Some(opacity) = args.opacity {
        params.opacity = opacity;
    }
    if let Some(precision) = args.precision {
        params.label_format = LabelFormat::new(precision, params.label_format.separator.clone());
    }
    params.feature_labels = args.label_field.as_deref().map(|field| {
        let mut labels = LabelStyle::new(field);
        if let Some(size) = args.label_size {
            labels.font_size = size;
        }
        if let Some(color) = args.label_color {
            labels.font_color = color;
        }
        labels.background = args.label_halo;
        labels
    });

    let sample = session.sample()?;
    let spec = session.apply()?.clone();

    if args.json {
        let render = render::build(&spec);
        println!("{}", serde_json::to_string_pretty(&render)?);
    } else {
        if let Some(classification) = session.last_classification() {
            print_substitution(classification);
        }
        print_style_header(&spec);
        println!(
            "{} {} classified, {} without data",
            "Values:".bold(),
            sample.len(),
            hidden_features(&session)?
        );
        let counts = class_counts(&sample, spec.breaks());
        print_legend(&spec, Some(&counts));
        println!();
        println!("{} {:.4}", "GVF:".bold(), gvf(&sample, spec.breaks()));
    }

    if let Some(name) = &args.save {
        let path = session.save_preset(name)?;
        eprintln!("Preset saved to: {}", path.display());
    }
    Ok(())
}

/// Features hidden for lack of a value in the styled field.
fn hidden_features(session: &StyleSession) -> Result<usize> {
    let paints = session.feature_paints()?;
    Ok(paints.iter().filter(|(_, c)| *c == Rgba::TRANSPARENT).count())
}

fn run_presets(command: &PresetCommand, styles_dir: &Path) -> Result<()> {
    let store = PresetStore::new(styles_dir);
    match command {
        PresetCommand::List => {
            let names = store.list()?;
            if names.is_empty() {
                eprintln!("No presets in {}", styles_dir.display());
            }
            for name in names {
                println!("{name}");
            }
        }
        PresetCommand::Show { name, json } => {
            let mut session = StyleSession::new(store);
            let spec = session
                .load_preset(name)
                .with_context(|| format!("loading preset '{name}'"))?
                .clone();
            if *json {
                println!("{}", serde_json::to_string_pretty(&render::build(&spec))?);
            } else {
                print_style_header(&spec);
                print_legend(&spec, None);
            }
        }
        PresetCommand::Remove { name } => {
            store.remove(name)?;
            eprintln!("Removed preset '{name}'");
        }
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Fields { file } => run_fields(file),
        Command::Stats { file, field } => run_stats(file, field, &cli.styles_dir),
        Command::Classify(args) => run_classify(args, &cli.styles_dir),
        Command::Presets(command) => run_presets(command, &cli.styles_dir),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            print_error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
