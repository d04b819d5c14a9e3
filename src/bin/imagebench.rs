use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use imagebench::{
    AnchorPoint, DefaultCodec, DocId, Edge, ExportFormat, ImageSource, LayoutMode, ManualScheduler,
    Point, Vec2, Workbench, WorkbenchConfig,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "imagebench", version)]
struct Cli {
    /// Workbench config JSON.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Grow or shrink an image's canvas, bake it, and write the result.
    Canvas(CanvasArgs),
    /// Print the animation timeline and simulate playback ticks.
    Sequence(SequenceArgs),
    /// Measure an overlay's position relative to a base image.
    Place(PlaceArgs),
}

#[derive(Parser, Debug)]
struct CanvasArgs {
    /// Input image.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Output image; the format follows the extension.
    #[arg(long)]
    out: PathBuf,

    /// Pixels added above the image (negative crops).
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    top: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    bottom: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    left: f64,
    #[arg(long, default_value_t = 0.0, allow_negative_numbers = true)]
    right: f64,

    /// JPEG quality (1-100).
    #[arg(long)]
    quality: Option<u8>,
}

#[derive(Parser, Debug)]
struct SequenceArgs {
    /// Frames, in load order.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Per-frame durations in seconds, matched to images by position.
    #[arg(long, value_delimiter = ',')]
    durations: Vec<f64>,

    /// Number of timer ticks to simulate.
    #[arg(long, default_value_t = 0)]
    ticks: usize,
}

#[derive(Parser, Debug)]
struct PlaceArgs {
    #[arg(long)]
    base: PathBuf,

    #[arg(long)]
    overlay: PathBuf,

    /// Base anchor, e.g. `top_left` or `center`.
    #[arg(long, default_value = "center")]
    anchor: String,

    /// Overlay center in workbench coordinates.
    #[arg(long, allow_negative_numbers = true)]
    x: f64,
    #[arg(long, allow_negative_numbers = true)]
    y: f64,
}

fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => WorkbenchConfig::from_path(path)?,
        None => WorkbenchConfig::default(),
    };
    let bench = Workbench::new(config, ManualScheduler::new())?;

    match cli.cmd {
        Command::Canvas(args) => cmd_canvas(bench, args),
        Command::Sequence(args) => cmd_sequence(bench, args),
        Command::Place(args) => cmd_place(bench, args),
    }
}

fn load_one(bench: &mut Workbench, path: &Path) -> anyhow::Result<DocId> {
    bench
        .load(&[ImageSource::path(path)], &DefaultCodec)
        .first()
        .copied()
        .with_context(|| format!("decode image '{}'", path.display()))
}

fn cmd_canvas(mut bench: Workbench, args: CanvasArgs) -> anyhow::Result<()> {
    let format = args
        .out
        .extension()
        .and_then(|e| e.to_str())
        .and_then(ExportFormat::from_extension)
        .with_context(|| format!("unsupported output extension '{}'", args.out.display()))?;

    let id = load_one(&mut bench, &args.in_path)?;
    bench.set_canvas_resize_mode(true);
    // Edges grow outward: top and left move against the axis.
    bench.edge_resize(id, Edge::Top, Vec2::new(0.0, -args.top));
    bench.edge_resize(id, Edge::Bottom, Vec2::new(0.0, args.bottom));
    bench.edge_resize(id, Edge::Left, Vec2::new(-args.left, 0.0));
    bench.edge_resize(id, Edge::Right, Vec2::new(args.right, 0.0));
    bench.set_canvas_resize_mode(false);

    let bytes = bench.export(id, &DefaultCodec, format, args.quality)?;
    if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    std::fs::write(&args.out, bytes)
        .with_context(|| format!("write image '{}'", args.out.display()))?;

    if let Some(doc) = bench.document(id) {
        println!(
            "{}x{}",
            doc.display_size.width.round(),
            doc.display_size.height.round()
        );
    }
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_sequence(mut bench: Workbench, args: SequenceArgs) -> anyhow::Result<()> {
    let sources: Vec<ImageSource> = args.images.iter().map(ImageSource::path).collect();
    let ids = bench.load(&sources, &DefaultCodec);
    if ids.is_empty() {
        anyhow::bail!("no frames could be decoded");
    }
    if ids.len() == sources.len() {
        for (&id, &secs) in ids.iter().zip(&args.durations) {
            bench.set_frame_duration(id, secs);
        }
    } else if !args.durations.is_empty() {
        tracing::warn!("some frames failed to decode; ignoring --durations");
    }

    for (idx, doc) in bench.visible_frames().into_iter().enumerate() {
        println!(
            "{idx}\t{}\t{:.3}s\t{}",
            doc.name, doc.frame_duration, doc.animation_order
        );
    }

    bench.set_layout_mode(LayoutMode::Animation);
    bench.start_animation();
    for _ in 0..args.ticks {
        let Some(token) = bench.scheduler_mut().next_due(Duration::MAX) else {
            break;
        };
        bench.on_timer(token);
        let at = bench.scheduler().now().as_secs_f64();
        if let Some(doc) = bench.current_frame() {
            println!("t={at:.3}s frame={} {}", bench.current_frame_index(), doc.name);
        }
    }
    bench.stop_animation();
    Ok(())
}

fn cmd_place(mut bench: Workbench, args: PlaceArgs) -> anyhow::Result<()> {
    let anchor: AnchorPoint =
        serde_json::from_value(serde_json::Value::String(args.anchor.clone()))
            .with_context(|| format!("unknown anchor '{}'", args.anchor))?;

    let base = load_one(&mut bench, &args.base)?;
    let overlay = load_one(&mut bench, &args.overlay)?;
    bench.set_layout_mode(LayoutMode::Placement);
    bench.set_base_image(Some(base));
    bench.set_anchor_point(base, anchor);
    bench.set_position(overlay, Point::new(args.x, args.y));

    let rel = bench
        .relative_position(overlay, None, None)
        .context("overlay has no relative position")?;
    println!("{:.1} {:.1}", rel.x, rel.y);
    Ok(())
}
