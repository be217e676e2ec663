use std::path::PathBuf;

use clap::{Parser, Subcommand};
use nsr::commands;
use nsr::io::{LOG_FILE, default_data_dir, load_config, write_json};
use nsr::{LogTarget, init_logging};
use nsr_core::projection::Viewport;

#[derive(Parser, Debug)]
#[command(name = "nsr")]
#[command(about = "Economic viability analysis for NSR-evaluated block models")]
struct Args {
    /// Path to the data directory (default: ~/.nsr/)
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Economic configuration file (default: <data-dir>/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Override the configured cutoff cost, $/t
    #[arg(long, global = true)]
    cutoff: Option<f64>,

    /// Log level (debug, info, warn, error)
    #[arg(short, long, default_value = "warn", global = true)]
    log_level: String,

    /// Log to a file instead of stderr (default: <data-dir>/nsr.log)
    #[arg(long, global = true, num_args = 0..=1)]
    log_file: Option<Option<PathBuf>>,

    /// Write the JSON report here instead of stdout
    #[arg(short, long, global = true)]
    output: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Bucket blocks into viable, marginal and inviable
    Classify {
        /// Block model (CSV, YAML or JSON)
        blocks: PathBuf,
        /// Column mapping for CSV input (YAML or JSON, header: field)
        #[arg(short, long)]
        mapping: Option<PathBuf>,
        /// Recompute viability flags from the cutoff
        #[arg(long)]
        reflag: bool,
        /// Include block ids per bucket
        #[arg(long)]
        list: bool,
    },
    /// Project one level into viewport rectangles with colour tiers
    Heatmap {
        blocks: PathBuf,
        #[arg(short, long)]
        mapping: Option<PathBuf>,
        /// Elevation to project; lists the levels when omitted
        #[arg(short = 'z', long)]
        level: Option<f64>,
        #[arg(long, default_value_t = 800.0)]
        width: f64,
        #[arg(long, default_value_t = 600.0)]
        height: f64,
    },
    /// Aggregate snapshots into a viability timeline
    Timeline {
        /// List of snapshots (YAML or JSON)
        snapshots: PathBuf,
        /// Report dates where the average NSR rises through this level, $/t
        #[arg(long)]
        alert_nsr: Option<f64>,
    },
    /// Interpret a goal-seek solver outcome
    GoalSeek {
        /// Solver outcome (YAML or JSON)
        outcome: PathBuf,
    },
    /// Locate where a sensitivity curve crosses a target NSR
    BreakEven {
        /// Sensitivity samples (YAML or JSON)
        samples: PathBuf,
        #[arg(short, long, default_value_t = 0.0)]
        target: f64,
    },
    /// Suggest a column mapping for a CSV header
    Mapping { csv: PathBuf },
    /// List the variables available for sweeps and goal-seek
    Variables,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let args = Args::parse();
    let data_dir = args.data_dir.unwrap_or_else(default_data_dir);

    let log_target = match args.log_file {
        Some(Some(path)) => LogTarget::File(path),
        Some(None) => LogTarget::File(data_dir.join(LOG_FILE)),
        None => LogTarget::Stderr,
    };
    init_logging(&log_target, &args.log_level)?;

    let mut config = load_config(args.config.as_deref(), &data_dir)?;
    if let Some(cutoff) = args.cutoff {
        config = config.with_cutoff(cutoff);
        config.validate()?;
    }
    tracing::debug!(cutoff = config.cutoff, "Loaded configuration");

    let output = args.output.as_deref();
    match args.command {
        Command::Classify {
            blocks,
            mapping,
            reflag,
            list,
        } => {
            let mapping = mapping.as_deref().map(commands::load_mapping).transpose()?;
            let report =
                commands::classify_blocks(&config, &blocks, mapping.as_ref(), reflag, list)?;
            write_json(&report, output)?;
        }
        Command::Heatmap {
            blocks,
            mapping,
            level,
            width,
            height,
        } => {
            let mapping = mapping.as_deref().map(commands::load_mapping).transpose()?;
            let viewport = Viewport::new(width, height);
            let report = commands::heatmap(&config, &blocks, mapping.as_ref(), level, viewport)?;
            write_json(&report, output)?;
        }
        Command::Timeline {
            snapshots,
            alert_nsr,
        } => {
            write_json(&commands::timeline(&config, &snapshots, alert_nsr)?, output)?;
        }
        Command::GoalSeek { outcome } => {
            write_json(&commands::goal_seek(&outcome)?, output)?;
        }
        Command::BreakEven { samples, target } => {
            write_json(&commands::break_even(&samples, target)?, output)?;
        }
        Command::Mapping { csv } => {
            write_json(&commands::detect_mapping(&csv)?, output)?;
        }
        Command::Variables => {
            write_json(&commands::variables(), output)?;
        }
    }

    Ok(())
}
