// THEORY:
// This file is the main entry point for the `pyro_nav` library crate.
// It follows the standard Rust convention of using `lib.rs` to define the public
// API that will be exposed to external consumers (like a robot host or a
// simulation harness).
//
// The primary goal is to export the `ControlPipeline` and its associated data
// structures (`PipelineConfig`, `TickReport`, etc.) as the clean, high-level
// interface for the entire navigation engine. The internal modules
// (`core_modules`) remain reachable for hosts that want to drive a single
// stage on its own, but the pipeline is the intended seam.

pub mod core_modules;
pub mod pipeline;
