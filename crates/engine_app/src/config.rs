//! Command-line configuration.

use std::path::PathBuf;

use clap::Parser;

use crate::tick::TickConfig;

#[derive(Debug, Parser)]
#[command(name = "engine_app", about = "Build or load a scene, tick its systems and save it")]
pub struct Args {
    /// Target ticks per second
    #[arg(short = 'r', long, default_value_t = 60.0)]
    pub tick_rate: f64,

    /// Number of ticks to run (0 runs until interrupted)
    #[arg(short, long, default_value_t = 120)]
    pub ticks: u64,

    /// Scene file to load instead of building the demo scene
    #[arg(short, long)]
    pub scene: Option<PathBuf>,

    /// Where to write the scene after the last tick
    #[arg(long)]
    pub save: Option<PathBuf>,

    /// Number of lights in the demo scene
    #[arg(short, long, default_value_t = 4)]
    pub lights: usize,

    /// Print the final scene tree as JSON
    #[arg(long)]
    pub dump: bool,
}

impl Args {
    /// Tick loop settings. Non-positive rates fall back to the default.
    #[must_use]
    pub fn tick_config(&self) -> TickConfig {
        let defaults = TickConfig::default();
        TickConfig {
            tick_rate: if self.tick_rate > 0.0 {
                self.tick_rate
            } else {
                defaults.tick_rate
            },
            max_ticks: self.ticks,
        }
    }
}
