// THEORY:
// The `pipeline` module is the final, top-level API for the entire navigation
// engine. It encapsulates the full architectural stack into a single,
// easy-to-use interface: one call per host tick, sensor snapshots in, wheel
// command out.
//
// Key architectural principles:
// 1.  **Strict Per-Tick Staging**: Every tick runs the same three stages in
//     order. The range scan reduces to a forward distance first, because the
//     detector's ground-plane rejection depends on it; the frame then reduces
//     to a detection; finally the navigator combines both with its retained
//     state to produce the command.
// 2.  **Snapshot Discipline**: The pipeline borrows the frame and the scan for
//     the duration of one call and retains neither. The only state that
//     survives a tick is the navigator's `NavState` and the last emitted
//     command.
// 3.  **Degrade, Never Crash**: A tick without a frame or without a scan
//     performs no decisioning at all: the navigator is left untouched and the
//     previous command is re-emitted. Sensor dropout holds the robot's
//     behavior; it never panics and never advances the state machine.
// 4.  **Tunable Constants In One Place**: `PipelineConfig` gathers every
//     threshold of the detector and the navigator, with `Default` reproducing
//     the field-tuned values of the original controller.

use crate::core_modules::fire_detector::fire_detector;
use crate::core_modules::navigator::Navigator;
use crate::core_modules::range_finder::range_finder;
use image::RgbImage;
use log::debug;

// Re-export key data structures for the public API.
pub use crate::core_modules::fire_detector::DetectionResult;
pub use crate::core_modules::motor::MotorCommand;
pub use crate::core_modules::navigator::{NavAction, NavState, StepOutput};

/// Configuration for the ControlPipeline, allowing for tunable behavior.
/// Distances are in meters, speeds in rad/s, and tick counts in host time
/// steps.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Frame width in pixels; fixed for the session.
    pub frame_width: u32,
    /// Frame height in pixels; fixed for the session.
    pub frame_height: u32,
    /// Maximum wheel speed; every command is clamped to `[-max, +max]`.
    pub max_speed: f64,
    /// Reference fire color as (R, G, B).
    pub fire_color: [u8; 3],
    /// Per-channel distance from the reference color that still matches.
    pub color_tolerance: i32,
    /// The red channel must exceed green by more than this to match.
    pub red_green_margin: i32,
    /// Ground rows are only rejected when the forward distance exceeds this.
    pub ground_reject_min_distance: f32,
    /// Rows below this fraction of the frame height count as ground plane.
    pub ground_reject_row_fraction: f64,
    /// Below this distance the goal is reached regardless of detection.
    pub proximity_stop_distance: f32,
    /// Below this distance, a small fire signature means an obstacle ahead.
    pub obstacle_distance: f32,
    /// A signature under this many pixels is too small to be the target
    /// up close.
    pub small_signature_pixels: u32,
    /// Below this distance the goal is reached while the target is in view.
    pub safe_distance: f32,
    /// With the target lost, keep driving while an obstacle is closer than
    /// this. Deliberately distinct from `safe_distance`; the original
    /// controller carries both values.
    pub lost_target_hold_distance: f32,
    /// Abort the avoidance forward phase below this distance.
    pub wall_hazard_distance: f32,
    /// Normalized centroid offset under which the target counts as centered.
    pub align_tolerance: f64,
    /// Normalized centroid offset beyond which approach steering engages.
    pub steer_deadband: f64,
    /// Ticks to hold still before the avoidance turn.
    pub pre_avoid_ticks: u32,
    /// Avoidance ticks spent turning in place.
    pub avoid_turn_ticks: u32,
    /// Total avoidance ticks before the maneuver completes.
    pub avoid_total_ticks: u32,
}

impl Default for PipelineConfig {
    /// The field-tuned values of the original controller.
    fn default() -> Self {
        Self {
            frame_width: 128,
            frame_height: 128,
            max_speed: 3.0,
            fire_color: [251, 72, 15],
            color_tolerance: 50,
            red_green_margin: 40,
            ground_reject_min_distance: 1.0,
            ground_reject_row_fraction: 0.60,
            proximity_stop_distance: 0.6,
            obstacle_distance: 1.2,
            small_signature_pixels: 50,
            safe_distance: 0.8,
            lost_target_hold_distance: 0.9,
            wall_hazard_distance: 0.5,
            align_tolerance: 0.15,
            steer_deadband: 0.2,
            pre_avoid_ticks: 5,
            avoid_turn_ticks: 12,
            avoid_total_ticks: 60,
        }
    }
}

/// The primary output of the pipeline for a single tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// The wheel command to apply for this tick.
    pub command: MotorCommand,
    /// A one-shot world-mutation request, if this tick produced one.
    pub action: Option<NavAction>,
    /// The control state after this tick.
    pub state: NavState,
    /// The detection this tick was decided on (zeroed on a held tick).
    pub detection: DetectionResult,
    /// The forward distance this tick was decided on (infinite on a held
    /// tick).
    pub distance: f32,
}

/// The main, top-level struct for the navigation engine.
pub struct ControlPipeline {
    navigator: Navigator,
    config: PipelineConfig,
    last_command: MotorCommand,
}

impl ControlPipeline {
    pub fn new(config: PipelineConfig) -> Self {
        Self {
            navigator: Navigator::new(),
            config,
            last_command: MotorCommand::STOP,
        }
    }

    /// Runs one control tick on the latest sensor snapshots.
    ///
    /// Either snapshot may be absent for a tick; the pipeline then holds the
    /// previous command and leaves the control state untouched.
    pub fn process_tick(
        &mut self,
        frame: Option<&RgbImage>,
        scan: Option<&[f32]>,
    ) -> TickReport {
        let (Some(frame), Some(scan)) = (frame, scan) else {
            debug!("sensor snapshot missing, holding previous command");
            return TickReport {
                command: self.last_command,
                action: None,
                state: self.navigator.state(),
                detection: DetectionResult::NONE,
                distance: f32::INFINITY,
            };
        };

        // Stage 1: Range Reduction
        let distance = range_finder::min_forward_distance(scan);

        // Stage 2: Fire Detection (the distance gates ground-plane rejection)
        let detection = fire_detector::scan_frame(frame, distance, &self.config);

        // Stage 3: Navigation Step
        let output = self.navigator.step(&detection, distance, &self.config);
        self.last_command = output.command;

        TickReport {
            command: output.command,
            action: output.action,
            state: self.navigator.state(),
            detection,
            distance,
        }
    }

    pub fn state(&self) -> NavState {
        self.navigator.state()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }
}
