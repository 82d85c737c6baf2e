use crate::config::{Config, load_config, merge_layout_overrides};
use crate::layout::{Diagnostic, DiagnosticKind, Layout, LayoutError, compute_layout};
use crate::layout_dump::{layout_dump_json, write_layout_dump};
use crate::parser::parse_entities;
use crate::render::{render_svg, write_output_svg};
use anyhow::Result;
use clap::{ArgAction, Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Parser, Debug)]
#[command(name = "rtree", version, about = "Lays out research trees as a left-to-right grid")]
pub struct Args {
    /// Input entity file (.json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON if omitted.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file (theme, layout and render sections)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Width available to the grid of unconnected entities
    #[arg(long = "display-width")]
    pub display_width: Option<f32>,

    /// Smallest category that still forms its own tree
    #[arg(long = "min-trunk-size")]
    pub min_trunk_size: Option<usize>,

    /// More log output on stderr (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let input = read_input(args.input.as_deref())?;
    let parsed = parse_entities(&input)?;
    let mut config = load_config(args.config.as_deref())?;
    if let Some(overrides) = parsed.layout_overrides.as_ref() {
        merge_layout_overrides(&mut config.layout, overrides);
    }
    apply_cli_overrides(&mut config, &args);

    let mut layout =
        compute_layout(parsed.entities.as_slice(), &config.layout).map_err(layout_failure)?;
    for id in parsed.duplicates {
        layout.diagnostics.push(Diagnostic {
            kind: DiagnosticKind::DuplicateId,
            entity: id,
            detail: "repeated id ignored".to_string(),
        });
    }
    tracing::info!(
        nodes = layout.nodes.len(),
        trees = layout.named_trees().count(),
        diagnostics = layout.diagnostics.len(),
        "layout computed"
    );

    write_layout(&layout, &config, &args)
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let _ = tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_max_level(level)
        .with_target(false)
        .try_init();
}

/// Cycles come from the input; every other layout error is an engine fault.
fn layout_failure(err: LayoutError) -> anyhow::Error {
    if err.is_internal() {
        tracing::error!(error = %err, "layout engine fault");
        anyhow::anyhow!("internal layout error, please report it: {err}")
    } else {
        anyhow::Error::new(err)
    }
}

fn apply_cli_overrides(config: &mut Config, args: &Args) {
    if let Some(width) = args.display_width {
        config.layout.display_width = width.max(0.0);
    }
    if let Some(size) = args.min_trunk_size {
        config.layout.min_trunk_size = size.max(1);
    }
}

fn write_layout(layout: &Layout, config: &Config, args: &Args) -> Result<()> {
    match args.output_format {
        OutputFormat::Json => match args.output.as_deref() {
            Some(path) => write_layout_dump(path, layout),
            None => {
                println!("{}", layout_dump_json(layout)?);
                Ok(())
            }
        },
        OutputFormat::Svg => {
            let svg = render_svg(layout, &config.theme, &config.layout, &config.render);
            write_output_svg(&svg, args.output.as_deref())
        }
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            let svg = render_svg(layout, &config.theme, &config.layout, &config.render);
            write_png(&svg, &output, config)
        }
    }
}

#[cfg(feature = "png")]
fn write_png(svg: &str, output: &Path, config: &Config) -> Result<()> {
    crate::render::write_output_png(svg, output, &config.theme)
}

#[cfg(not(feature = "png"))]
fn write_png(_svg: &str, _output: &Path, _config: &Config) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_short_flags() {
        let args = Args::try_parse_from([
            "rtree",
            "-i",
            "tree.json",
            "-e",
            "json",
            "--min-trunk-size",
            "3",
            "-vv",
        ])
        .unwrap();
        assert_eq!(args.output_format, OutputFormat::Json);
        assert_eq!(args.min_trunk_size, Some(3));
        assert_eq!(args.verbose, 2);
    }

    #[test]
    fn cli_overrides_win_over_config() {
        let args = Args::try_parse_from(["rtree", "--display-width", "750", "--min-trunk-size", "0"])
            .unwrap();
        let mut config = Config::default();
        apply_cli_overrides(&mut config, &args);
        assert_eq!(config.layout.display_width, 750.0);
        assert_eq!(config.layout.min_trunk_size, 1);
        assert_eq!(config.layout.nodes_per_row(), 3);
    }

    #[test]
    fn internal_layout_errors_are_flagged() {
        let cycle = layout_failure(LayoutError::CycleDetected {
            ids: vec!["a".to_string(), "b".to_string()],
        });
        assert_eq!(cycle.to_string(), "prerequisite cycle between: a, b");
        let conflict = layout_failure(LayoutError::Unplaced {
            id: "solar".to_string(),
        });
        assert_eq!(
            conflict.to_string(),
            "internal layout error, please report it: `solar` was never assigned a lane"
        );
    }

    #[test]
    fn png_needs_output_path() {
        assert!(ensure_output(&None, "png").is_err());
        assert_eq!(
            ensure_output(&Some(PathBuf::from("out.png")), "png").unwrap(),
            PathBuf::from("out.png")
        );
    }
}
