use crate::config::{Config, load_config};
use crate::demo::demo_members;
use crate::geometry::{BoundingBox, GeometryProvider, GeometrySnapshot, NodeRef, ViewportBox};
use crate::layout::{RowLayout, TreeLayout, group_by_generation};
use crate::layout_dump::{TreeDump, write_tree_dump};
use crate::member::{Member, parse_members};
use crate::presentation::{NavAction, Navigator};
use crate::render::{TreeScene, render_svg, write_output_png, write_output_svg};
use crate::stabilizer::{LayoutStabilizer, RetrySchedule};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ancestry", version, about = "Family tree layout and connector renderer")]
pub struct Args {
    /// Member list (.json) or '-' for stdin
    #[arg(short = 'i', long = "input", conflicts_with = "demo")]
    pub input: Option<PathBuf>,

    /// Use the built-in demo family instead of an input file
    #[arg(long = "demo")]
    pub demo: bool,

    /// Output file (svg/png/json). Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config JSON file
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Measured geometry snapshot (JSON) to route against instead of the built-in row layout
    #[arg(short = 'g', long = "geometry")]
    pub geometry: Option<PathBuf>,

    /// Render presentation mode focused on this generation
    #[arg(short = 'p', long = "present", allow_hyphen_values = true)]
    pub present: Option<i64>,

    /// Viewport width
    #[arg(short = 'w', long = "width", default_value_t = 1200.0)]
    pub width: f32,

    /// Viewport height
    #[arg(short = 'H', long = "height", default_value_t = 800.0)]
    pub height: f32,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

enum Surface {
    Rows(RowLayout),
    Snapshot(GeometrySnapshot),
}

impl Surface {
    fn provider(&self) -> &dyn GeometryProvider {
        match self {
            Surface::Rows(rows) => rows,
            Surface::Snapshot(snapshot) => snapshot,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    config.render.width = args.width;
    config.render.height = args.height;
    let viewport = ViewportBox::new(args.width, args.height);

    let members = if args.demo {
        demo_members()
    } else {
        read_members(args.input.as_deref())?
    };
    tracing::info!(members = members.len(), "loaded members");

    let generations = group_by_generation(&members);
    let surface = match args.geometry.as_deref() {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading geometry snapshot {}", path.display()))?;
            let mut snapshot = GeometrySnapshot::from_json(&text)?;
            if snapshot.viewport.is_none() {
                snapshot.viewport = Some(viewport);
            }
            Surface::Snapshot(snapshot)
        }
        None => Surface::Rows(RowLayout::compute(&generations, &config.layout, viewport)),
    };
    let geometry = surface.provider();

    // One offline pass: the geometry is already final, so flush instead of waiting.
    let mut stabilizer = LayoutStabilizer::new(
        RetrySchedule::from_config(&config.stabilizer),
        config.router.clone(),
    );
    stabilizer.members_changed(Duration::ZERO, &members);
    let connectors = stabilizer.flush(geometry).to_vec();
    let tree = TreeLayout {
        families: stabilizer.families().to_vec(),
        generations,
        connectors,
    };
    tracing::info!(
        generations = tree.generations.len(),
        families = tree.families.len(),
        connectors = tree.connectors.len(),
        "layout complete"
    );

    let navigator = match args.present {
        Some(target) => Some(present_at(&tree, target, geometry, &config)?),
        None => None,
    };

    match args.output_format {
        OutputFormat::Json => {
            let presentation = navigator
                .as_ref()
                .map(|nav| (nav.current_generation(), nav.state()));
            write_tree_dump(args.output.as_deref(), &TreeDump::from_tree(&tree, presentation))?;
        }
        OutputFormat::Svg | OutputFormat::Png => {
            let (width, height) = content_size(&surface, &members, &config);
            let scene = TreeScene {
                generations: &tree.generations,
                connectors: &tree.connectors,
                geometry,
                width,
                height,
                presentation: navigator
                    .as_ref()
                    .and_then(|nav| nav.current_generation().map(|generation| (generation, nav.state()))),
            };
            let svg = render_svg(&scene, &config.theme, &config);
            if args.output_format == OutputFormat::Svg {
                write_output_svg(&svg, args.output.as_deref())?;
            } else {
                let output = ensure_output(&args.output, "png")?;
                write_output_png(&svg, &output, &config.render)?;
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("ancestry_layout={level}")));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn read_members(path: Option<&Path>) -> Result<Vec<Member>> {
    let text = match path {
        Some(path) if path != Path::new("-") => std::fs::read_to_string(path)
            .with_context(|| format!("reading members from {}", path.display()))?,
        _ => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    Ok(parse_members(&text)?)
}

/// Steps a fresh navigator to `target` with manual `next` actions.
fn present_at(tree: &TreeLayout, target: i64, geometry: &dyn GeometryProvider, config: &Config) -> Result<Navigator> {
    let index = tree
        .generations
        .index_of(target)
        .ok_or_else(|| anyhow::anyhow!("Generation {} not present in the tree", target))?;
    let mut navigator = Navigator::new(tree.generations.keys.clone(), config.presentation.clone());
    for _ in 0..index {
        navigator.apply(NavAction::Next);
    }
    if !navigator.refit(geometry) {
        tracing::warn!(generation = target, "row geometry unavailable, presenting unscaled");
    }
    Ok(navigator)
}

fn content_size(surface: &Surface, members: &[Member], config: &Config) -> (f32, f32) {
    match surface {
        Surface::Rows(rows) => (rows.width(), rows.height()),
        Surface::Snapshot(snapshot) => {
            let extent = members
                .iter()
                .filter_map(|m| snapshot.bounding_box_of(NodeRef::Member(&m.id)))
                .reduce(|acc, bbox| acc.union(&bbox))
                .unwrap_or(BoundingBox::new(0.0, 0.0, config.render.width, config.render.height));
            let pad = config.layout.content_padding;
            (
                (extent.right + pad).max(config.render.width),
                (extent.bottom + pad).max(config.render.height),
            )
        }
    }
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!(
        "Output path required for {} output",
        ext
    ))
}
