use anyhow::Context;
use clap::Parser;
use cleaning_robots::{SimConfig, Simulation};
use std::{fs, path::PathBuf, thread, time::Duration};
use tracing_subscriber::EnvFilter;

/// Runs a cleaning robot simulation until the grid is clean or time runs out.
#[derive(Debug, Parser)]
#[command(name = "cleaning-sim", version)]
struct Args {
    /// JSON file with the simulation parameters. Flags override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of cleaners.
    #[arg(long)]
    cleaners: Option<usize>,

    /// Grid width.
    #[arg(long)]
    width: Option<usize>,

    /// Grid height.
    #[arg(long)]
    height: Option<usize>,

    /// Maximum number of ticks.
    #[arg(long)]
    max_ticks: Option<usize>,

    /// Share of the grid, between 0 and 100, that starts dirty.
    #[arg(long)]
    dirty_percentage: Option<f64>,

    /// Seed for the random number generator.
    #[arg(long)]
    seed: Option<u64>,

    /// Use a grid whose edges don't wrap around.
    #[arg(long)]
    bounded: bool,

    /// Where to save a JSON replay of the run.
    #[arg(long)]
    replay: Option<String>,

    /// Draw the grid after every tick.
    #[arg(long)]
    draw: bool,

    /// Pause between ticks when drawing, in milliseconds.
    #[arg(long, default_value_t = 100)]
    delay_ms: u64,
}

impl Args {
    fn into_config(self) -> anyhow::Result<SimConfig> {
        let mut config = match &self.config {
            Some(path) => {
                let contents = fs::read_to_string(path)
                    .with_context(|| format!("could not read config file {}", path.display()))?;
                SimConfig::from_json(&contents)?
            }
            None => SimConfig::default(),
        };

        if let Some(cleaners) = self.cleaners {
            config.num_cleaners = cleaners;
        }
        if let Some(width) = self.width {
            config.grid_width = width;
        }
        if let Some(height) = self.height {
            config.grid_height = height;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        if let Some(dirty_percentage) = self.dirty_percentage {
            config.dirty_percentage = dirty_percentage;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if self.bounded {
            config.wrap = false;
        }
        if self.replay.is_some() {
            config.replay_filename = self.replay;
        }

        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let draw = args.draw;
    let delay = Duration::from_millis(args.delay_ms);
    let config = args.into_config()?;

    let mut simulation = Simulation::new(&config).context("could not create the simulation")?;

    if draw {
        simulation.draw()?;
    }

    while simulation.is_running() {
        simulation.step()?;

        if draw {
            simulation.draw()?;
            thread::sleep(delay);
        }
    }

    simulation
        .save_replay()
        .context("could not save the replay")?;

    println!("{}", serde_json::to_string_pretty(&simulation.summary())?);

    Ok(())
}
