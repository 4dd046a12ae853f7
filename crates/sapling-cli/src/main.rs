#![forbid(unsafe_code)]

use sapling::render::raster::{RasterError, RasterOptions};
use sapling::render::{HeadlessError, HeadlessRenderer, SvgRenderOptions};
use sapling::{LeafAlignment, SaplingConfig, SyntaxTree, TreeConfig};
use serde::Serialize;
use std::io::{Read, Write};
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Sapling(sapling::Error),
    Render(HeadlessError),
    Raster(RasterError),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Sapling(err) => write!(f, "{err}"),
            CliError::Render(err) => write!(f, "{err}"),
            CliError::Raster(err) => write!(f, "{err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<sapling::Error> for CliError {
    fn from(value: sapling::Error) -> Self {
        Self::Sapling(value)
    }
}

impl From<HeadlessError> for CliError {
    fn from(value: HeadlessError) -> Self {
        Self::Render(value)
    }
}

impl From<RasterError> for CliError {
    fn from(value: RasterError) -> Self {
        Self::Raster(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    Layout,
    #[default]
    Render,
}

#[derive(Debug, Clone, Copy, Default)]
enum RenderFormat {
    #[default]
    Svg,
    Png,
}

impl FromStr for RenderFormat {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Ok(Self::Svg),
            "png" => Ok(Self::Png),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    config: Option<String>,
    font_size: Option<f64>,
    font_family: Option<String>,
    no_triangles: bool,
    no_color: bool,
    no_subscript: bool,
    alignment: Option<String>,
    spacing: Option<f64>,
    render_format: RenderFormat,
    render_scale: f32,
    background: Option<String>,
    diagram_id: Option<String>,
    out: Option<String>,
    pretty: bool,
    verbose: bool,
}

fn usage() -> &'static str {
    "sapling-cli\n\
\n\
USAGE:\n\
  sapling-cli layout [--pretty] [TREE OPTIONS] [<path>|-]\n\
  sapling-cli [render] [--format svg|png] [--scale <n>] [--background <css-color>] [--id <diagram-id>] [--out <path>] [TREE OPTIONS] [<path>|-]\n\
\n\
TREE OPTIONS:\n\
  --config <file.json>   layered under the flags below\n\
  --font-size <px>       label size (default 16)\n\
  --font <family>        label font family (default sans-serif)\n\
  --no-triangles         draw multi-word leaves with a plain line\n\
  --no-color             draw every label in black\n\
  --no-subscript         do not number repeated labels\n\
  --align none|bottom|bottom+internal\n\
  --spacing <f>          vertical spacing factor (default 1)\n\
  -v, --verbose          debug logging on stderr (otherwise RUST_LOG, default warn)\n\
\n\
NOTES:\n\
  - Input is a JSON syntax tree: a `root` object, a single `node`/`value`, or a bare array of nodes.\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - render prints SVG to stdout by default; use --out to write a file.\n\
  - PNG output defaults to writing next to the input file (or ./out.png for stdin).\n\
"
}

fn positive_f64(raw: &str) -> Result<f64, CliError> {
    let v = raw.parse::<f64>().map_err(|_| CliError::Usage(usage()))?;
    if v.is_finite() && v > 0.0 {
        Ok(v)
    } else {
        Err(CliError::Usage(usage()))
    }
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args {
        render_scale: 1.0,
        ..Default::default()
    };

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "layout" => args.command = Command::Layout,
            "render" => args.command = Command::Render,
            "--pretty" => args.pretty = true,
            "-v" | "--verbose" => args.verbose = true,
            "--no-triangles" => args.no_triangles = true,
            "--no-color" => args.no_color = true,
            "--no-subscript" => args.no_subscript = true,
            "--config" => {
                let Some(path) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(path.clone());
            }
            "--font-size" => {
                let Some(size) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.font_size = Some(positive_f64(size)?);
            }
            "--font" => {
                let Some(family) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !family.trim().is_empty() {
                    args.font_family = Some(family.trim().to_string());
                }
            }
            "--align" => {
                let Some(align) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                LeafAlignment::from_str(align).map_err(|_| CliError::Usage(usage()))?;
                args.alignment = Some(align.clone());
            }
            "--spacing" => {
                let Some(spacing) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.spacing = Some(positive_f64(spacing)?);
            }
            "--format" => {
                let Some(fmt) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_format = fmt
                    .parse::<RenderFormat>()
                    .map_err(|_| CliError::Usage(usage()))?;
            }
            "--scale" => {
                let Some(scale) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.render_scale = scale.parse::<f32>().map_err(|_| CliError::Usage(usage()))?;
                if !(args.render_scale.is_finite() && args.render_scale > 0.0) {
                    return Err(CliError::Usage(usage()));
                }
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.diagram_id = Some(id.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

/// Defaults, then the `--config` file, then individual flags.
fn build_config(args: &Args) -> Result<TreeConfig, CliError> {
    let mut layered = SaplingConfig::new();
    if let Some(path) = args.config.as_deref() {
        layered.layer(&SaplingConfig::from_json_str(&std::fs::read_to_string(path)?)?);
        tracing::debug!(path, "loaded config file");
    }

    let mut flags = SaplingConfig::new();
    if let Some(size) = args.font_size {
        flags.set("fontSize", size)?;
    }
    if let Some(family) = args.font_family.as_deref() {
        flags.set("fontFamily", family)?;
    }
    if args.no_triangles {
        flags.set("triangles", false)?;
    }
    if args.no_color {
        flags.set("nodeColor", false)?;
    }
    if args.no_subscript {
        flags.set("autoSubscript", false)?;
    }
    if let Some(align) = args.alignment.as_deref() {
        flags.set("alignment", align)?;
    }
    if let Some(spacing) = args.spacing {
        flags.set("spacing", spacing)?;
    }
    layered.layer(&flags);

    Ok(TreeConfig::from_config(&layered)?)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool) -> Result<(), CliError> {
    let mut stdout = std::io::stdout().lock();
    if pretty {
        serde_json::to_writer_pretty(&mut stdout, value)?;
    } else {
        serde_json::to_writer(&mut stdout, value)?;
    }
    writeln!(stdout)?;
    Ok(())
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None | Some("-") => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn default_raster_out_path(input: Option<&str>, ext: &str) -> std::path::PathBuf {
    match input {
        Some(path) if path != "-" => std::path::PathBuf::from(path).with_extension(ext),
        _ => std::path::PathBuf::from(format!("out.{ext}")),
    }
}

fn run(args: Args) -> Result<(), CliError> {
    let config = build_config(&args)?;
    let text = read_input(args.input.as_deref())?;
    let tree = SyntaxTree::from_json_str(&text)?;
    tracing::debug!(leaves = tree.leaf_count(), "parsed syntax tree");

    let renderer = HeadlessRenderer {
        config,
        svg: SvgRenderOptions {
            diagram_id: args.diagram_id.clone(),
            ..Default::default()
        },
        ..Default::default()
    };

    match args.command {
        Command::Layout => {
            let layout = renderer.layout_sync(&tree)?;
            write_json(&layout, args.pretty)
        }
        Command::Render => match args.render_format {
            RenderFormat::Svg => {
                let svg = renderer.render_svg_sync(&tree)?;
                write_text(&svg, args.out.as_deref())
            }
            RenderFormat::Png => {
                let raster = RasterOptions {
                    scale: args.render_scale,
                    background: args.background.clone(),
                };
                let bytes = renderer.render_png_sync(&tree, &raster)?;
                let out = args.out.clone().unwrap_or_else(|| {
                    default_raster_out_path(args.input.as_deref(), "png")
                        .to_string_lossy()
                        .to_string()
                });
                if out == "-" {
                    std::io::stdout().lock().write_all(&bytes)?;
                } else {
                    std::fs::write(&out, bytes)?;
                    tracing::debug!(path = %out, "wrote PNG");
                }
                Ok(())
            }
        },
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing(args.verbose);

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}
