//! # engine_app: scene runner
//!
//! Builds a demo scene (or loads one from disk), runs its systems on a
//! fixed-timestep tick loop and optionally saves the result.
//!
//! ## Startup Sequence
//!
//! 1. Parse the command line and initialise logging.
//! 2. Register component types and load or build the scene.
//! 3. Register systems and run the tick loop.
//! 4. Save and/or dump the final scene.

mod components;
mod config;
mod scene;
mod systems;
mod tick;

use anyhow::{Context, Result};
use clap::Parser;
use engine_world::World;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Args;
use tick::TickLoop;

fn main() -> Result<()> {
    // Initialise structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("engine_app=info,engine_world=info")),
        )
        .init();

    let args = Args::parse();
    info!("scene runner starting");

    let registry = components::registry();
    let world = match &args.scene {
        Some(path) => scene::load(registry.clone(), path)?,
        None => {
            let mut world = World::new(registry.clone());
            scene::build_demo(&mut world, args.lights)?;
            world
        }
    };

    let mut tick_loop = TickLoop::new(args.tick_config(), world);
    let movement = systems::Movement::new(&registry).context("movement components missing")?;
    let sway = systems::LightSway::new(&registry).context("light components missing")?;
    tick_loop.add_system(Box::new(movement));
    tick_loop.add_system(Box::new(sway));
    tick_loop.run();

    let world = tick_loop.into_world();
    if let Some(path) = &args.save {
        scene::save(&world, path)?;
    }
    if args.dump {
        println!("{}", scene::to_json(&world)?);
    }

    info!("scene runner shut down");
    Ok(())
}
