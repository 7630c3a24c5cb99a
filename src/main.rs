//! Runs one simulation in the terminal, printing a snapshot every second.

use std::{fmt::Debug, thread, time::Duration};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use syncsim::{DiningController, SimulationConfig, SleepingTaController, Snapshot};

#[derive(Parser)]
#[command(name = "syncsim")]
#[command(about = "Sleeping TA and dining philosophers, live")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// How long to let the simulation run
    #[arg(long, default_value = "10")]
    seconds: u64,

    /// Random seed for reproducible delays
    #[arg(long)]
    seed: Option<u64>,

    /// Enable verbose output
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Students waiting on hallway chairs for a single TA.
    Ta {
        #[arg(long, default_value = "5")]
        students: usize,
        #[arg(long, default_value = "3")]
        chairs: usize,
        /// Each student leaves for good after being helped once
        #[arg(long)]
        once: bool,
    },

    /// Philosophers sharing forks around a table. Pauses halfway through.
    Dining {
        #[arg(long, default_value = "5")]
        philosophers: usize,
    },
}

fn print_snapshot<S: Debug, C: Debug>(tick: u64, snap: &Snapshot<S, C>) {
    let states = snap
        .actors
        .iter()
        .map(|a| format!("{}:{:?}", a.id, a.state))
        .collect::<Vec<_>>()
        .join(" ");
    let free = snap.resources.iter().filter(|r| r.available).count();
    println!(
        "t={tick:>3}s [{}] {} | free {}/{} | queue {}{}",
        snap.message,
        states,
        free,
        snap.resources.len(),
        snap.queue_length,
        snap.coordinator
            .as_ref()
            .map(|c| format!(" | coordinator {c:?}"))
            .unwrap_or_default(),
    );
    if let Some(last) = snap.recent_log.last() {
        println!("       {last}");
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let grace = Duration::from_secs(2);
    match cli.command {
        Commands::Ta {
            students,
            chairs,
            once,
        } => {
            let mut config = SimulationConfig::sleeping_ta(students, chairs);
            config.seed = cli.seed;
            if once {
                config = config.once();
            }
            let ctl = SleepingTaController::new();
            ctl.start(config).context("starting sleeping TA")?;
            for tick in 1..=cli.seconds {
                thread::sleep(Duration::from_secs(1));
                print_snapshot(tick, &ctl.snapshot());
            }
            ctl.stop()?;
            info!(exited = ctl.wait_for_exit(grace), "sleeping TA finished");
        }

        Commands::Dining { philosophers } => {
            let mut config = SimulationConfig::dining(philosophers);
            config.seed = cli.seed;
            let ctl = DiningController::new();
            ctl.start(config).context("starting dining philosophers")?;
            let halfway = cli.seconds / 2;
            for tick in 1..=cli.seconds {
                thread::sleep(Duration::from_secs(1));
                if tick == halfway {
                    ctl.pause()?;
                } else if tick == halfway + 2 {
                    ctl.resume()?;
                }
                print_snapshot(tick, &ctl.snapshot());
            }
            ctl.stop()?;
            info!(exited = ctl.wait_for_exit(grace), "dining philosophers finished");
        }
    }
    Ok(())
}
