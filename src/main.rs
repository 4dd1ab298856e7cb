//! `gator-delivery` - runs a command script through the scheduler.
//!
//! Writes one line per event to `<input-stem>_output_file.txt` beside the
//! input unless `--output` is given.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gator_delivery::models::Event;
use gator_delivery::parser::parse_script;
use gator_delivery::scheduler::{SchedulerConfig, SchedulerEngine};
use gator_delivery::validation::validate_commands;

/// Order-delivery scheduler.
#[derive(Debug, Parser)]
#[command(name = "gator-delivery")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Command script, one command per line.
    input: PathBuf,

    /// Output file.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Refuse to run a script that fails validation.
    #[arg(long)]
    strict: bool,

    /// Priority step used when repairing order placement.
    #[arg(long, env = "GATOR_EPSILON")]
    epsilon: Option<f64>,

    /// Upper bound on repair steps per created order.
    #[arg(long, env = "GATOR_MAX_REPAIR_STEPS")]
    max_repair_steps: Option<usize>,
}

impl Cli {
    fn config(&self) -> SchedulerConfig {
        let mut config = SchedulerConfig::default();
        if let Some(epsilon) = self.epsilon {
            config = config.with_repair_epsilon(epsilon);
        }
        if let Some(steps) = self.max_repair_steps {
            config = config.with_max_repair_steps(steps);
        }
        config
    }

    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| default_output_path(&self.input))
    }
}

/// Output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One human-readable line per event.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// `dir/name.txt` → `dir/name_output_file.txt`
fn default_output_path(input: &Path) -> PathBuf {
    let mut path = input.with_extension("").into_os_string();
    path.push("_output_file.txt");
    PathBuf::from(path)
}

fn render(events: &[Event], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    for event in events {
        match format {
            OutputFormat::Text => out.push_str(&event.to_string()),
            OutputFormat::Json => out.push_str(&serde_json::to_string(event)?),
        }
        out.push('\n');
    }
    Ok(out)
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let script = fs::read_to_string(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;
    let commands = parse_script(&script)
        .with_context(|| format!("parsing {}", cli.input.display()))?;
    info!(commands = commands.len(), "script parsed");

    if let Err(errors) = validate_commands(&commands) {
        for error in &errors {
            warn!(kind = ?error.kind, "{}", error.message);
        }
        if cli.strict {
            bail!("{} validation error(s) in {}", errors.len(), cli.input.display());
        }
    }

    let mut engine = SchedulerEngine::with_config(cli.config());
    let events = engine.run(&commands);
    let summary = engine.summary();
    info!(
        events = events.len(),
        created = summary.created,
        delivered = summary.delivered,
        canceled = summary.canceled,
        rejected = summary.rejected,
        "run finished"
    );

    let output = cli.output_path();
    fs::write(&output, render(&events, cli.format)?)
        .with_context(|| format!("writing {}", output.display()))?;
    println!("Output has been written to {}", output.display());
    Ok(())
}
