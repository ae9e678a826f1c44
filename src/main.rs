// This file is a minimal example of how to use the `pyro_nav` library.
// The main library entry point is `src/lib.rs`; the full closed-loop
// simulation harness lives in the `sim_tester` crate.

use image::{Rgb, RgbImage};
use pyro_nav::pipeline::{ControlPipeline, PipelineConfig};

fn main() {
    println!("Pyro Nav Engine - Example Runner");

    // One tick against an empty scene: nothing in view, so the engine
    // commands the search spin. A real host would feed camera frames and
    // range scans here, once per time step.
    let config = PipelineConfig::default();
    let frame = RgbImage::from_pixel(config.frame_width, config.frame_height, Rgb([30, 30, 30]));
    let scan = vec![f32::INFINITY; 64];

    let mut pipeline = ControlPipeline::new(config);
    let report = pipeline.process_tick(Some(&frame), Some(&scan));
    println!(
        "state: {:?}, command: ({:.1}, {:.1})",
        report.state, report.command.left, report.command.right
    );
}
