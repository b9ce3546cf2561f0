use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use rand::SeedableRng as _;
use rand::rngs::SmallRng;

use treeflow::{
    AnimateOpts, AnimationDriver, CpuSurface, Dataset, FfmpegSink, FfmpegSinkOpts, FrameSink,
    LeafSlotRegistry, PngSequenceSink, PositionedKind, RouteSummary, Theme, VizConfig, classify,
    datagen, draw_driver, draw_frame, layout_tree, run_headless,
};

#[derive(Parser, Debug)]
#[command(name = "treeflow", version)]
struct Cli {
    /// Log level for stderr diagnostics.
    #[arg(long, global = true, default_value_t = tracing::Level::WARN)]
    log_level: tracing::Level,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a synthetic passenger table as JSON.
    Generate(GenerateArgs),
    /// Route every passenger through the tree and print where each one lands.
    Classify(ClassifyArgs),
    /// Render a single frame as a PNG.
    Frame(FrameArgs),
    /// Render the animation as a PNG sequence or an MP4 (MP4 requires `ffmpeg` on PATH).
    Render(RenderArgs),
}

#[derive(Parser, Debug)]
struct GenerateArgs {
    /// Output JSON path.
    #[arg(long)]
    out: PathBuf,

    /// Number of passengers.
    #[arg(long, default_value_t = datagen::DEFAULT_PASSENGERS)]
    count: usize,

    /// Fixed RNG seed.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Parser, Debug)]
struct ClassifyArgs {
    /// Passenger JSON.
    #[arg(long)]
    data: PathBuf,

    /// Visualizer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print one line per passenger instead of just the per-leaf summary.
    #[arg(long)]
    verbose: bool,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Visualizer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Passenger JSON. When given, the held-out run is played to the end first and the frame
    /// shows every settled token.
    #[arg(long)]
    data: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Passenger JSON.
    #[arg(long)]
    data: PathBuf,

    /// Output path: a `.mp4` file, or a directory for numbered PNG frames.
    #[arg(long)]
    out: PathBuf,

    /// Visualizer config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Copies of the final frame appended at the end.
    #[arg(long, default_value_t = 30)]
    hold_frames: u64,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log_level)
        .init();

    match cli.cmd {
        Command::Generate(args) => cmd_generate(args),
        Command::Classify(args) => cmd_classify(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Render(args) => cmd_render(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<VizConfig> {
    match path {
        Some(p) => Ok(VizConfig::from_path(p)?),
        None => Ok(VizConfig::default()),
    }
}

/// Lay out the configured tree and build a driver over the held-out subset of `data`.
fn build_driver(cfg: &VizConfig, data: &Path) -> anyhow::Result<AnimationDriver> {
    let dataset = Dataset::load(data)?;
    let mut rng = cfg.rng();
    let holdout = dataset.split_holdout(cfg.holdout_fraction, &mut rng)?;
    eprintln!(
        "{} passengers: {} train, {} held out",
        dataset.len(),
        holdout.train.len(),
        holdout.test.len()
    );
    let tree = layout_tree(&cfg.tree(), cfg.root_position(), cfg.layout)?;
    Ok(AnimationDriver::new(tree, holdout.test, cfg).with_rng(rng))
}

fn cmd_generate(args: GenerateArgs) -> anyhow::Result<()> {
    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_os_rng(),
    };
    let records = datagen::generate(args.count, &mut rng)?;
    datagen::write_json(&records, &args.out)?;
    eprintln!("wrote {} passengers to {}", records.len(), args.out.display());
    Ok(())
}

fn cmd_classify(args: ClassifyArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let dataset = Dataset::load(&args.data)?;
    let tree = layout_tree(&cfg.tree(), cfg.root_position(), cfg.layout)?;

    if args.verbose {
        for record in dataset.records() {
            let route = classify(record, &tree)?;
            let labels: Vec<String> = route
                .nodes
                .iter()
                .skip(1)
                .filter_map(|id| tree.node(*id))
                .map(|n| n.branch_value.clone().unwrap_or_default())
                .collect();
            let leaf = tree
                .node(route.leaf)
                .map(|n| n.label.as_str())
                .unwrap_or("?");
            println!(
                "{}\t{}\t{} -> {} ({} steps)",
                record.id,
                record.sex.as_tag(),
                labels.join(" / "),
                leaf,
                route.steps()
            );
        }
    }

    let summary = RouteSummary::collect(dataset.records(), &tree)?;
    for (id, tally) in &summary.per_leaf {
        let Some(node) = tree.node(*id) else {
            continue;
        };
        let mut path: Vec<&str> =
            std::iter::successors(Some(node), |n| n.parent.and_then(|p| tree.node(p)))
                .filter_map(|n| n.branch_value.as_deref())
                .collect();
        path.reverse();
        let outcome = match &node.kind {
            PositionedKind::Leaf { outcome, .. } => format!("{outcome:?}"),
            PositionedKind::Split { .. } => continue,
        };
        println!(
            "{:<28} {:<9} routed {:>4}  correct {:>4}",
            path.join(" / "),
            outcome,
            tally.routed,
            tally.correct
        );
    }
    match summary.accuracy() {
        Some(acc) => println!("accuracy {:.1}% over {} passengers", acc * 100.0, summary.total()),
        None => println!("no passengers"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let theme = Theme::from_config(&cfg);
    let mut surface = CpuSurface::from_config(&cfg)?;

    match &args.data {
        Some(data) => {
            let mut driver = build_driver(&cfg, data)?;
            let ticks = run_headless(&mut driver, cfg.fps)?;
            tracing::info!(ticks, "run played to completion");
            draw_driver(&mut surface, &driver, &theme)?;
        }
        None => {
            let tree = layout_tree(&cfg.tree(), cfg.root_position(), cfg.layout)?;
            let registry = LeafSlotRegistry::new(&tree, cfg.slots, cfg.leaf_radius);
            draw_frame(&mut surface, &tree, &registry, None, &theme)?;
        }
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    surface.snapshot().save_png(&args.out)?;
    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let theme = Theme::from_config(&cfg);
    let mut surface = CpuSurface::from_config(&cfg)?;
    let mut driver = build_driver(&cfg, &args.data)?;

    let is_mp4 = args
        .out
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case("mp4"));
    let mut sink: Box<dyn FrameSink> = if is_mp4 {
        Box::new(FfmpegSink::new(FfmpegSinkOpts::from_config(&args.out, &cfg)))
    } else {
        Box::new(PngSequenceSink::new(&args.out))
    };

    let stats = treeflow::animate(
        &mut driver,
        &mut surface,
        &theme,
        cfg.fps,
        sink.as_mut(),
        AnimateOpts {
            hold_frames: args.hold_frames,
            max_frames: None,
        },
    )
    .context("render animation")?;

    eprintln!(
        "wrote {} ({} frames, {} tokens settled)",
        args.out.display(),
        stats.frames_total,
        stats.records_settled
    );
    Ok(())
}
