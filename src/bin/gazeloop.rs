use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "gazeloop", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a synthetic gated timeline against simulated backends and print status lines.
    Simulate(SimulateArgs),
    /// Print the view sector table as JSON.
    Sectors(SectorsArgs),
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Engine config JSON (defaults when omitted).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to run.
    #[arg(long, default_value_t = 600)]
    ticks: u64,

    /// Simulated decoder frame rate.
    #[arg(long, default_value_t = 30.0)]
    fps: f64,

    /// Length of the gated segment, seconds.
    #[arg(long, default_value_t = 10.0)]
    duration: f64,

    /// Gate time relative to segment start, seconds.
    #[arg(long, default_value_t = 6.0)]
    gate: f64,

    /// Sector that releases the gate.
    #[arg(long, default_value_t = 3)]
    target: usize,

    /// Sector watched before the switch.
    #[arg(long, default_value_t = 0)]
    from_view: usize,

    /// Tick at which the gaze moves to the target sector.
    #[arg(long, default_value_t = 300)]
    switch_at: u64,

    /// Print every n-th tick (ticks with a jump or segment change are always printed).
    #[arg(long, default_value_t = 30)]
    every: u64,

    /// Append a plain segment after the gated one.
    #[arg(long)]
    two_segments: bool,
}

#[derive(Parser, Debug)]
struct SectorsArgs {
    /// Engine config JSON (defaults when omitted).
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(serde::Serialize)]
struct TickLine<'a> {
    tick: u64,
    report: &'a gazeloop::TickReport,
    status: gazeloop::PlayerStatus,
}

fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Simulate(args) => cmd_simulate(args),
        Command::Sectors(args) => cmd_sectors(args),
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<gazeloop::EngineConfig> {
    match path {
        Some(p) => gazeloop::EngineConfig::from_path(p)
            .with_context(|| format!("load engine config '{}'", p.display())),
        None => Ok(gazeloop::EngineConfig::default()),
    }
}

fn synthetic_timeline(
    cfg: &gazeloop::EngineConfig,
    args: &SimulateArgs,
) -> anyhow::Result<Vec<gazeloop::Segment>> {
    anyhow::ensure!(
        args.target < cfg.num_views && args.from_view < cfg.num_views,
        "sectors must be < num_views ({})",
        cfg.num_views
    );
    let fps = gazeloop::Fps::from_rate(args.fps)?;
    let gate_frame = fps.secs_to_frames_round(args.gate);
    // Every non-target view loops one second before the gate back by two seconds.
    let cut = gate_frame.saturating_sub(fps.secs_to_frames_round(1.0));
    let back = cut.saturating_sub(fps.secs_to_frames_round(2.0));
    let tables = (0..cfg.num_views)
        .map(|v| {
            if v == args.target || cut == back {
                Ok(gazeloop::CutTable::default())
            } else {
                gazeloop::CutTable::new(vec![gazeloop::CutEdge::new(cut, back)])
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let gate = gazeloop::GatedSegment::new(
        Some(args.gate),
        gazeloop::GateCondition::new([args.target], gazeloop::GatePolarity::LookAt),
    )
    .with_graph(gazeloop::JumpGraph::from_cut_tables(tables));
    let mut segments = vec![gazeloop::Segment::new_gated(
        "gated",
        0.0,
        args.duration,
        0.0,
        gate,
    )];
    if args.two_segments {
        segments.push(gazeloop::Segment::new_plain(
            "outro",
            args.duration,
            args.duration * 1.5,
            args.duration,
        ));
    }
    Ok(segments)
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.every > 0, "--every must be > 0");
    let cfg = load_config(args.config.as_deref())?;
    let segments = synthetic_timeline(&cfg, &args)?;
    let media_len = if args.two_segments {
        args.duration * 1.5
    } else {
        args.duration
    };
    let settings = gazeloop::BackendSettings::new(args.fps, media_len);
    let mut player = gazeloop::Player::with_backends(
        cfg,
        segments,
        gazeloop::BackendKind::Simulated,
        &settings,
    )?;

    let center = |view: usize| {
        player
            .resolver()
            .sectors()
            .get(view)
            .map(|s| s.center)
            .unwrap_or_default()
    };
    let before = gazeloop::PinholeCamera::looking_at(center(args.from_view));
    let after = gazeloop::PinholeCamera::looking_at(center(args.target));

    let dt = 1.0 / args.fps;
    player.play();
    for tick in 0..args.ticks {
        let camera = if tick < args.switch_at { &before } else { &after };
        let report = player.tick(dt, camera);
        let notable = report.completed.is_some()
            || report.stale_reseek
            || matches!(report.decision, Some(gazeloop::GateDecision::Jump { .. }));
        if notable || tick % args.every == 0 || report.end_of_sequence {
            let line = TickLine {
                tick,
                report: &report,
                status: player.status(),
            };
            println!("{}", serde_json::to_string(&line)?);
        }
        if report.end_of_sequence {
            break;
        }
    }
    Ok(())
}

fn cmd_sectors(args: SectorsArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let sectors = gazeloop::ViewSectors::from_config(&cfg)?;
    let table: Vec<_> = sectors.iter().collect();
    println!("{}", serde_json::to_string_pretty(&table)?);
    Ok(())
}
