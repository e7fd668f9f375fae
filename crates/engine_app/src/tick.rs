//! Fixed-timestep tick loop.
//!
//! Each tick runs every system once, in registration order, against the
//! loop's world, passing the fixed step as the delta time.

use std::time::{Duration, Instant};

use engine_world::{System, SystemList, World};
use tracing::{debug, info, warn};

/// Configuration for the tick loop.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Target ticks per second.
    pub tick_rate: f64,
    /// Maximum number of ticks to run (0 = unlimited).
    pub max_ticks: u64,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            max_ticks: 0,
        }
    }
}

/// A world, the systems that update it, and the tick counter.
#[derive(Debug)]
pub struct TickLoop {
    tick_id: u64,
    config: TickConfig,
    world: World,
    systems: SystemList,
}

impl TickLoop {
    /// Create a tick loop over `world` with no systems.
    #[must_use]
    pub fn new(config: TickConfig, world: World) -> Self {
        Self {
            tick_id: 0,
            config,
            world,
            systems: SystemList::new(),
        }
    }

    /// Returns the current tick counter.
    #[must_use]
    pub fn tick_id(&self) -> u64 {
        self.tick_id
    }

    /// Returns a reference to the world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Returns a mutable reference to the world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Append a system. Returns `false` if its signature is rejected.
    pub fn add_system(&mut self, system: Box<dyn System>) -> bool {
        self.systems.add_system(system)
    }

    /// The registered systems.
    #[must_use]
    pub fn systems(&self) -> &SystemList {
        &self.systems
    }

    /// Give up the world, e.g. to save it.
    #[must_use]
    pub fn into_world(self) -> World {
        self.world
    }

    /// Run one tick.
    pub fn tick(&mut self, dt: f64) {
        self.tick_id += 1;
        debug!(
            tick_id = self.tick_id,
            dt,
            systems = self.systems.len(),
            "tick start"
        );
        self.world.update_systems(&mut self.systems, dt as f32);
    }

    /// Run the tick loop for the configured number of ticks, or indefinitely.
    pub fn run(&mut self) {
        let tick_duration = Duration::from_secs_f64(1.0 / self.config.tick_rate);
        let mut tick_count = 0u64;

        info!(
            tick_rate = self.config.tick_rate,
            max_ticks = self.config.max_ticks,
            entities = self.world.entity_count(),
            "starting tick loop"
        );

        loop {
            let start = Instant::now();

            self.tick(tick_duration.as_secs_f64());

            tick_count += 1;
            if self.config.max_ticks > 0 && tick_count >= self.config.max_ticks {
                info!(ticks = tick_count, "tick loop complete");
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < tick_duration {
                std::thread::sleep(tick_duration - elapsed);
            } else {
                warn!(
                    tick_id = self.tick_id,
                    elapsed_ms = elapsed.as_millis() as u64,
                    budget_ms = tick_duration.as_millis() as u64,
                    "tick exceeded time budget"
                );
            }
        }
    }
}
