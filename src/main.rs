//! activity-monitor - replay pose streams through the activity monitor.
//!
//! Reads one s-expression message per line from a file or stdin and writes
//! one response per line to stdout.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use activity_monitor::activity::{ActivityConfig, ActivityMonitor};
use activity_monitor::ipc::{handle_message, ControlState};
use anyhow::Context;
use clap::Parser;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "activity-monitor", about = "VR activity and exercise gesture monitor")]
struct Cli {
    /// TOML configuration file (defaults for every missing field)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Message stream to replay (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    /// Only print responses that carry events
    #[arg(long)]
    events_only: bool,

    /// Show version and exit
    #[arg(long)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if cli.version {
        println!("activity-monitor {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "activity_monitor=info".into()),
        )
        .init();

    info!("activity-monitor v{} starting", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => ActivityConfig::load(path)?,
        None => ActivityConfig::default(),
    };

    let reader: Box<dyn BufRead> = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("opening input {}", path.display()))?;
            info!("replaying {}", path.display());
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut state = ControlState::new(ActivityMonitor::new(config));
    let stdout = io::stdout();
    let mut out = stdout.lock();

    for (line_no, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("reading line {}", line_no + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(';') {
            continue;
        }

        let Some(response) = handle_message(&mut state, trimmed) else {
            continue;
        };
        if cli.events_only && state.last_message_events == 0 {
            debug!(line = line_no + 1, "no events");
            continue;
        }
        writeln!(out, "{}", response).context("writing response")?;
    }
    out.flush().context("flushing stdout")?;

    let score = state.monitor.score();
    let snapshot = state.monitor.state();
    info!(
        frames = state.frames,
        events = state.events,
        squats = snapshot.squat().count(),
        jumping_jacks = snapshot.jumping_jack().total(),
        side_leans = snapshot.side_lean().total(),
        "session complete, score {:.0} (distance {:.0})",
        score.total,
        score.distance_score
    );

    Ok(())
}
