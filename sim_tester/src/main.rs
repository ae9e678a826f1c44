mod world;

use clap::Parser;
use log::{info, warn};
use pyro_nav::pipeline::{ControlPipeline, NavAction, NavState, PipelineConfig};
use rand::SeedableRng;
use rand::rngs::StdRng;
use world::SimWorld;

/// Closed-loop simulation harness for the pyro_nav engine.
#[derive(Parser)]
struct SimArgs {
    /// Maximum number of ticks to run before giving up.
    #[arg(long, default_value_t = 5000)]
    ticks: u64,
    /// RNG seed for the simulated sensor noise.
    #[arg(long, default_value_t = 7)]
    seed: u64,
    /// Camera frame width in pixels.
    #[arg(long, default_value_t = 128)]
    width: u32,
    /// Camera frame height in pixels.
    #[arg(long, default_value_t = 128)]
    height: u32,
    /// Drop both sensor snapshots every Nth tick to exercise the hold policy.
    #[arg(long)]
    drop_every: Option<u64>,
    /// Start the world without a fire object (the extinguish action becomes
    /// a no-op).
    #[arg(long)]
    no_fire: bool,
}

fn main() {
    pretty_env_logger::init();
    let args = SimArgs::parse();

    // --- 1. World & Pipeline Initialization ---
    let config = PipelineConfig {
        frame_width: args.width,
        frame_height: args.height,
        ..PipelineConfig::default()
    };
    let mut world = SimWorld::new(
        args.width,
        args.height,
        config.fire_color,
        !args.no_fire,
        StdRng::seed_from_u64(args.seed),
    );
    if world.fire.is_none() {
        warn!("no fire object in the world; extinguish will be a no-op");
    }
    let mut pipeline = ControlPipeline::new(config);

    info!("=== pyro_nav simulation: {} ticks max ===", args.ticks);

    // --- 2. Main Tick Loop ---
    let mut extinguished = false;
    let mut last_state = pipeline.state();
    for tick in 0..args.ticks {
        let dropped = args.drop_every.is_some_and(|n| n > 0 && tick % n == n - 1);

        // --- 3. Sensor Snapshots ---
        let frame = (!dropped).then(|| world.render());
        let scan = (!dropped).then(|| world.scan());

        // --- 4. Control Step ---
        let report = pipeline.process_tick(frame.as_ref(), scan.as_deref());

        if report.state != last_state {
            info!(
                "tick {tick}: {:?} -> {:?} (distance {:.2}, {} fire px)",
                last_state, report.state, report.distance, report.detection.pixel_count
            );
            last_state = report.state;
        }

        // --- 5. Actuation & World Mutation ---
        world.apply(report.command);
        if let Some(NavAction::Extinguish) = report.action {
            if world.fire.is_some() {
                world.extinguish();
                extinguished = true;
                info!("tick {tick}: fire extinguished");
            } else {
                warn!("tick {tick}: extinguish requested but no fire object");
            }
        }

        if report.state == NavState::Stopped {
            break;
        }
    }

    // --- 6. Session Summary ---
    match (pipeline.state(), extinguished) {
        (NavState::Stopped, true) => info!("run complete: goal reached, fire extinguished"),
        (NavState::Stopped, false) => info!("run complete: stopped without a fire to remove"),
        (state, _) => {
            let remaining = world
                .distance_to_fire()
                .map_or("none".to_string(), |d| format!("{d:.2} m away"));
            info!("run ended in {state:?}; fire {remaining}");
        }
    }
}
