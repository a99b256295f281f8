use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use pizza_timer::{
    config::{Configuration, RuntimeOverrides},
    policy::simulate_schedule,
    processing::labels::format_clock,
    tasks,
    timing::TimerConfig,
};
use tokio_util::sync::CancellationToken;
use tracing::{Level, info};
use tracing_subscriber::{EnvFilter, fmt};

#[derive(Debug, Parser)]
#[command(
    name = "pizza-timer",
    version,
    about = "Exam progress timer that reveals a pizza as time passes"
)]
struct Args {
    /// Path to YAML config
    #[arg(value_name = "CONFIG", default_value = "config.yaml")]
    config: PathBuf,

    /// Seed for the random image policy (overrides the config file)
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Resume with this much exam time left, e.g. `1h 20m`
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    start_remaining: Option<Duration>,

    /// Print the first N image-change boundaries and exit without opening a window
    #[arg(long, value_name = "N")]
    schedule_dry_run: Option<usize>,

    /// Increase log verbosity (repeatable)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_tracing(verbosity: u8) -> Result<()> {
    let level = match verbosity {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"))
        .add_directive(format!("pizza_timer={level}").parse()?)
        .add_directive("wgpu=warn".parse()?)
        .add_directive("winit=warn".parse()?);
    fmt().with_env_filter(filter).with_target(true).init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;

    let cfg = Configuration::from_yaml_file(&args.config)
        .with_context(|| format!("failed to load configuration from {}", args.config.display()))?
        .validated()
        .context("invalid configuration values")?;
    let timer = cfg
        .timer_config(RuntimeOverrides {
            seed: args.seed,
            start_remaining: args.start_remaining,
        })
        .context("failed to build timer configuration")?;

    if let Some(boundaries) = args.schedule_dry_run {
        return run_schedule_dry_run(&timer, boundaries);
    }

    info!(
        config = %args.config.display(),
        images = timer.image_list().len(),
        "starting pizza timer"
    );

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("ctrl-c received; initiating shutdown");
                cancel.cancel();
            }
        });
    }

    // Runs on the main thread until the window closes or cancellation fires.
    tasks::viewer::run_windowed(cfg, timer, cancel.clone()).context("timer failed")?;
    cancel.cancel();
    Ok(())
}

fn run_schedule_dry_run(timer: &TimerConfig, boundaries: usize) -> Result<()> {
    let plan = simulate_schedule(timer, boundaries)?;
    let images = timer.image_list();

    println!(
        "# schedule dry run\n# images: {}\n# total: {}\n# change interval: {}\n# policy: {}\n# seed: {}\n",
        images.len(),
        format_clock(timer.total_duration()),
        format_clock(timer.image_change_interval()),
        timer.image_change_policy(),
        timer
            .seed()
            .map_or_else(|| "(random)".to_string(), |s| s.to_string())
    );

    for entry in &plan {
        let name = images
            .get(entry.image_index)
            .map_or_else(|| "?".to_string(), |p| p.display().to_string());
        println!(
            "  {:>4}  {:>8} elapsed  {:>6.2}%  {}",
            entry.change_index,
            format_clock(entry.elapsed),
            entry.fraction_complete * 100.0,
            name
        );
    }
    if plan.len() <= boundaries {
        println!("\n# exam ends; no further image changes");
    }
    Ok(())
}
