// THEORY:
// The `navigator` is the heart of the engine: the stateful layer that turns
// the stateless perception results into wheel commands. It consumes one
// `DetectionResult` and one forward distance per tick and advances a
// six-state machine.
//
// Key architectural principles:
// 1.  **Sum Type Over Shared Counter**: The avoidance timer lives inside the
//     `PreAvoid` and `Avoiding` variants themselves instead of as a separate
//     mutable counter next to the state. A transition into or out of either
//     variant rebuilds the variant, so the timer can never survive a
//     transition it should not survive.
// 2.  **Priority-Ordered Decisions**: Within `MovingFast` the checks run in a
//     strict order (proximity stop, obstacle, visual stop, lost target,
//     steering). The first one that fires decides the tick; nothing below it
//     is consulted.
// 3.  **Scripted Avoidance**: The avoidance maneuver is a fixed-duration
//     script keyed off the tick counter, not a reactive planner. The only
//     sensor input it honors is the wall-hazard abort during its forward
//     phase.
// 4.  **One-Shot Termination**: `Stopped` is terminal. The extinguish action
//     is emitted exactly once, on the tick that enters the state, guarded by
//     the `target_present` flag; every later tick in `Stopped` is a no-op
//     holding the robot still.
// 5.  **Exactly One Step Per Tick**: The navigator owns no clock and performs
//     no I/O. The host calls `step` once per discrete time step and applies
//     the returned command; all speed outputs pass through the clamp.

use crate::core_modules::fire_detector::DetectionResult;
use crate::core_modules::motor::MotorCommand;
use crate::pipeline::PipelineConfig;
use log::{debug, info};

/// The persistent control state, advanced exactly once per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    /// No target in view; rotating in place until one appears.
    Searching,
    /// Target in view; pivoting until its centroid is centered enough.
    Aligning,
    /// Target centered; driving toward it with two-level steering.
    MovingFast,
    /// Halted before the avoidance turn, letting momentum settle.
    PreAvoid {
        /// Ticks spent holding still so far.
        held_ticks: u32,
    },
    /// Running the scripted turn-then-forward avoidance maneuver.
    Avoiding {
        /// Ticks elapsed since the maneuver began.
        elapsed_ticks: u32,
    },
    /// Terminal: goal reached, robot holding still.
    Stopped,
}

/// A one-shot side effect the host must apply when a step requests it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavAction {
    /// Remove the fire object from the world; emitted at most once.
    Extinguish,
}

/// The output of one navigation step: the wheel command for this tick and an
/// optional one-shot action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutput {
    pub command: MotorCommand,
    pub action: Option<NavAction>,
}

/// The navigation state machine. Owns the `NavState` and the one-shot
/// extinguish bookkeeping; never accessed concurrently.
pub struct Navigator {
    state: NavState,
    /// True until the extinguish action has been emitted.
    target_present: bool,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            state: NavState::Searching,
            target_present: true,
        }
    }

    /// The current control state, exposed for hosts and diagnostics.
    pub fn state(&self) -> NavState {
        self.state
    }

    /// Advances the machine by one tick and returns the wheel command.
    /// Must be called exactly once per host time step.
    pub fn step(
        &mut self,
        detection: &DetectionResult,
        distance: f32,
        config: &PipelineConfig,
    ) -> StepOutput {
        let center_x = f64::from(config.frame_width) / 2.0;
        let offset = if detection.found {
            (detection.centroid_x - center_x) / center_x
        } else {
            0.0
        };

        let max = config.max_speed;
        let mut action = None;

        let (raw_left, raw_right, next_state) = match self.state {
            NavState::Searching => {
                if detection.found {
                    info!("fire signature acquired, stabilizing before alignment");
                    (0.0, 0.0, NavState::Aligning)
                } else {
                    // Slow spin in place until something fire-colored shows up.
                    (-1.0, 1.0, NavState::Searching)
                }
            }

            NavState::Aligning => {
                if !detection.found {
                    debug!("signature lost during alignment, resuming search");
                    (0.0, 0.0, NavState::Searching)
                } else if offset.abs() < config.align_tolerance {
                    info!("target centered (offset {offset:.3}), starting approach");
                    (0.0, 0.0, NavState::MovingFast)
                } else if offset < 0.0 {
                    // Bang-bang pivot: sign of the offset only, no proportional term.
                    (-0.5, 0.5, NavState::Aligning)
                } else {
                    (0.5, -0.5, NavState::Aligning)
                }
            }

            NavState::MovingFast => {
                if distance < config.proximity_stop_distance {
                    info!("goal reached (proximity stop at {distance:.2} m)");
                    action = self.take_extinguish();
                    (0.0, 0.0, NavState::Stopped)
                } else if distance < config.obstacle_distance
                    && detection.pixel_count < config.small_signature_pixels
                {
                    // Something close ahead while the fire signature is still
                    // small: an obstacle, not the target itself.
                    info!(
                        "obstacle at {distance:.2} m with small signature ({} px), avoiding",
                        detection.pixel_count
                    );
                    (0.0, 0.0, NavState::PreAvoid { held_ticks: 0 })
                } else if distance < config.safe_distance {
                    info!("goal reached (visual stop at {distance:.2} m)");
                    action = self.take_extinguish();
                    (0.0, 0.0, NavState::Stopped)
                } else if !detection.found {
                    if distance < config.lost_target_hold_distance {
                        // Obstacle proximity implies the target is still near;
                        // trust the recent heading and keep driving.
                        (max, max, NavState::MovingFast)
                    } else {
                        debug!("target lost at {distance:.2} m, resuming search");
                        (0.0, 0.0, NavState::Searching)
                    }
                } else if offset < -config.steer_deadband {
                    // Two-level differential steering: slow the inner wheel.
                    (max * 0.8, max, NavState::MovingFast)
                } else if offset > config.steer_deadband {
                    (max, max * 0.8, NavState::MovingFast)
                } else {
                    (max, max, NavState::MovingFast)
                }
            }

            NavState::PreAvoid { held_ticks } => {
                let held_ticks = held_ticks + 1;
                if held_ticks > config.pre_avoid_ticks {
                    debug!("momentum settled, starting avoidance turn");
                    (0.0, 0.0, NavState::Avoiding { elapsed_ticks: 0 })
                } else {
                    (0.0, 0.0, NavState::PreAvoid { held_ticks })
                }
            }

            NavState::Avoiding { elapsed_ticks } => {
                let elapsed_ticks = elapsed_ticks + 1;
                if elapsed_ticks < config.avoid_turn_ticks {
                    // Fixed-duration turn, not sensor-terminated.
                    (2.0, -2.0, NavState::Avoiding { elapsed_ticks })
                } else if elapsed_ticks < config.avoid_total_ticks {
                    if distance < config.wall_hazard_distance {
                        info!("wall hazard at {distance:.2} m, aborting avoidance");
                        (0.0, 0.0, NavState::Searching)
                    } else {
                        (max, max, NavState::Avoiding { elapsed_ticks })
                    }
                } else {
                    info!("avoidance complete, resuming search");
                    (0.0, 0.0, NavState::Searching)
                }
            }

            NavState::Stopped => (0.0, 0.0, NavState::Stopped),
        };

        self.state = next_state;

        StepOutput {
            command: MotorCommand::clamped(raw_left, raw_right, max),
            action,
        }
    }

    /// Claims the one-shot extinguish action; `None` on every call after the
    /// first.
    fn take_extinguish(&mut self) -> Option<NavAction> {
        if self.target_present {
            self.target_present = false;
            info!("extinguishing fire");
            Some(NavAction::Extinguish)
        } else {
            None
        }
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::PipelineConfig;

    fn config() -> PipelineConfig {
        PipelineConfig::default()
    }

    /// A detection centered on the frame with the given pixel count.
    fn centered_detection(config: &PipelineConfig, pixel_count: u32) -> DetectionResult {
        DetectionResult {
            found: true,
            centroid_x: f64::from(config.frame_width) / 2.0,
            centroid_y: f64::from(config.frame_height) / 2.0,
            pixel_count,
        }
    }

    fn no_detection() -> DetectionResult {
        DetectionResult::NONE
    }

    /// Drives a fresh navigator into `MovingFast`: one tick to acquire, one to
    /// align.
    fn navigator_in_moving_fast(config: &PipelineConfig) -> Navigator {
        let mut nav = Navigator::new();
        nav.step(&centered_detection(config, 500), f32::INFINITY, config);
        nav.step(&centered_detection(config, 500), f32::INFINITY, config);
        assert_eq!(nav.state(), NavState::MovingFast);
        nav
    }

    #[test]
    fn searching_spins_until_target_found() {
        let config = config();
        let mut nav = Navigator::new();

        let out = nav.step(&no_detection(), f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::Searching);
        assert_eq!(out.command, MotorCommand::clamped(-1.0, 1.0, config.max_speed));
    }

    #[test]
    fn searching_halts_and_aligns_on_detection() {
        let config = config();
        let mut nav = Navigator::new();

        let out = nav.step(&centered_detection(&config, 100), f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::Aligning);
        assert!(out.command.is_stop());
        assert!(out.action.is_none());
    }

    #[test]
    fn aligning_with_centered_target_advances_to_moving_fast() {
        let config = config();
        let mut nav = Navigator::new();
        nav.step(&centered_detection(&config, 100), f32::INFINITY, &config);

        let out = nav.step(&centered_detection(&config, 100), f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::MovingFast);
        assert!(out.command.is_stop());
    }

    #[test]
    fn aligning_pivots_toward_an_off_center_target() {
        let config = config();
        let mut nav = Navigator::new();
        nav.step(&centered_detection(&config, 100), f32::INFINITY, &config);

        // Target well left of center: negative offset, pivot left.
        let left_detection = DetectionResult {
            centroid_x: 1.0,
            ..centered_detection(&config, 100)
        };
        let out = nav.step(&left_detection, f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::Aligning);
        assert_eq!(out.command, MotorCommand::clamped(-0.5, 0.5, config.max_speed));

        // Target well right of center: positive offset, pivot right.
        let right_detection = DetectionResult {
            centroid_x: f64::from(config.frame_width) - 1.0,
            ..centered_detection(&config, 100)
        };
        let out = nav.step(&right_detection, f32::INFINITY, &config);
        assert_eq!(out.command, MotorCommand::clamped(0.5, -0.5, config.max_speed));
    }

    #[test]
    fn aligning_falls_back_to_searching_when_target_lost() {
        let config = config();
        let mut nav = Navigator::new();
        nav.step(&centered_detection(&config, 100), f32::INFINITY, &config);

        nav.step(&no_detection(), f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::Searching);
    }

    #[test]
    fn proximity_stop_fires_regardless_of_detection() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        let out = nav.step(&no_detection(), 0.5, &config);
        assert_eq!(nav.state(), NavState::Stopped);
        assert!(out.command.is_stop());
        assert_eq!(out.action, Some(NavAction::Extinguish));
    }

    #[test]
    fn small_signature_near_obstacle_triggers_pre_avoid() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        let detection = centered_detection(&config, 10);
        let out = nav.step(&detection, 1.0, &config);
        assert_eq!(nav.state(), NavState::PreAvoid { held_ticks: 0 });
        assert!(out.command.is_stop());
        assert!(out.action.is_none());
    }

    #[test]
    fn large_signature_near_obstacle_is_the_target_itself() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        // 1.0 m is inside the obstacle window but the signature is large, and
        // 1.0 is not below the 0.8 visual stop, so the approach continues.
        let detection = centered_detection(&config, 500);
        let out = nav.step(&detection, 1.0, &config);
        assert_eq!(nav.state(), NavState::MovingFast);
        assert_eq!(
            out.command,
            MotorCommand::clamped(config.max_speed, config.max_speed, config.max_speed)
        );
    }

    #[test]
    fn visual_stop_fires_between_obstacle_checks_and_steering() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        let detection = centered_detection(&config, 500);
        let out = nav.step(&detection, 0.7, &config);
        assert_eq!(nav.state(), NavState::Stopped);
        assert_eq!(out.action, Some(NavAction::Extinguish));
    }

    #[test]
    fn lost_target_close_to_obstacle_holds_heading() {
        // The hold-heading path sits below the obstacle branch in priority,
        // so it needs a config whose obstacle window is tighter than the
        // lost-target hold distance.
        let config = PipelineConfig {
            obstacle_distance: 0.7,
            ..PipelineConfig::default()
        };
        let mut nav = navigator_in_moving_fast(&config);

        let out = nav.step(&no_detection(), 0.85, &config);
        assert_eq!(nav.state(), NavState::MovingFast);
        assert_eq!(
            out.command,
            MotorCommand::clamped(config.max_speed, config.max_speed, config.max_speed)
        );
    }

    #[test]
    fn lost_target_far_from_obstacle_resumes_search() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        nav.step(&no_detection(), 2.0, &config);
        assert_eq!(nav.state(), NavState::Searching);
    }

    #[test]
    fn steering_slows_the_inner_wheel() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        let left_target = DetectionResult {
            centroid_x: f64::from(config.frame_width) * 0.2,
            ..centered_detection(&config, 500)
        };
        let out = nav.step(&left_target, 3.0, &config);
        assert_eq!(
            out.command,
            MotorCommand::clamped(config.max_speed * 0.8, config.max_speed, config.max_speed)
        );

        let right_target = DetectionResult {
            centroid_x: f64::from(config.frame_width) * 0.8,
            ..centered_detection(&config, 500)
        };
        let out = nav.step(&right_target, 3.0, &config);
        assert_eq!(
            out.command,
            MotorCommand::clamped(config.max_speed, config.max_speed * 0.8, config.max_speed)
        );
    }

    #[test]
    fn pre_avoid_holds_for_five_ticks_then_starts_avoiding() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);
        nav.step(&centered_detection(&config, 10), 1.0, &config);

        // Five held ticks: still settling.
        for expected in 1..=5 {
            let out = nav.step(&no_detection(), 1.0, &config);
            assert_eq!(nav.state(), NavState::PreAvoid { held_ticks: expected });
            assert!(out.command.is_stop());
        }

        // The sixth tick crosses the threshold and resets the timer.
        nav.step(&no_detection(), 1.0, &config);
        assert_eq!(nav.state(), NavState::Avoiding { elapsed_ticks: 0 });
    }

    /// Drives a fresh navigator to `Avoiding { elapsed_ticks: 0 }`.
    fn navigator_in_avoiding(config: &PipelineConfig) -> Navigator {
        let mut nav = navigator_in_moving_fast(config);
        nav.step(&centered_detection(config, 10), 1.0, config);
        for _ in 0..6 {
            nav.step(&no_detection(), 1.0, config);
        }
        assert_eq!(nav.state(), NavState::Avoiding { elapsed_ticks: 0 });
        nav
    }

    #[test]
    fn avoidance_turn_phase_emits_the_fixed_turn_command() {
        let config = config();
        let mut nav = navigator_in_avoiding(&config);

        for _ in 0..11 {
            let out = nav.step(&no_detection(), f32::INFINITY, &config);
            assert_eq!(out.command, MotorCommand::clamped(2.0, -2.0, config.max_speed));
        }
        // Tick 12 enters the forward phase.
        let out = nav.step(&no_detection(), f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::Avoiding { elapsed_ticks: 12 });
        assert_eq!(
            out.command,
            MotorCommand::clamped(config.max_speed, config.max_speed, config.max_speed)
        );
    }

    #[test]
    fn wall_hazard_aborts_the_forward_phase() {
        let config = config();
        let mut nav = navigator_in_avoiding(&config);

        for _ in 0..11 {
            nav.step(&no_detection(), f32::INFINITY, &config);
        }
        let out = nav.step(&no_detection(), 0.3, &config);
        assert_eq!(nav.state(), NavState::Searching);
        assert!(out.command.is_stop());
    }

    #[test]
    fn avoidance_completes_at_the_scripted_duration() {
        let config = config();
        let mut nav = navigator_in_avoiding(&config);

        // Ticks 1..=59 stay inside the maneuver.
        for _ in 0..59 {
            nav.step(&no_detection(), f32::INFINITY, &config);
            assert!(matches!(nav.state(), NavState::Avoiding { .. }));
        }
        // Tick 60 completes it.
        let out = nav.step(&no_detection(), f32::INFINITY, &config);
        assert_eq!(nav.state(), NavState::Searching);
        assert!(out.command.is_stop());
    }

    #[test]
    fn stopped_is_terminal_and_extinguishes_exactly_once() {
        let config = config();
        let mut nav = navigator_in_moving_fast(&config);

        let first = nav.step(&no_detection(), 0.5, &config);
        assert_eq!(first.action, Some(NavAction::Extinguish));

        for _ in 0..3 {
            let out = nav.step(&centered_detection(&config, 500), 0.5, &config);
            assert_eq!(nav.state(), NavState::Stopped);
            assert!(out.command.is_stop());
            assert!(out.action.is_none());
        }
    }

    #[test]
    fn every_emitted_command_respects_the_speed_bound() {
        let config = config();
        let mut nav = Navigator::new();

        // A scripted tour through every state, including the out-of-range
        // avoidance turn values.
        let script: Vec<(DetectionResult, f32)> = std::iter::empty()
            .chain(std::iter::repeat_n((no_detection(), f32::INFINITY), 3))
            .chain([(centered_detection(&config, 500), f32::INFINITY)])
            .chain([(centered_detection(&config, 500), f32::INFINITY)])
            .chain([(centered_detection(&config, 10), 1.0)])
            .chain(std::iter::repeat_n((no_detection(), 1.0), 20))
            .chain(std::iter::repeat_n((no_detection(), f32::INFINITY), 60))
            .collect();

        for (detection, distance) in script {
            let out = nav.step(&detection, distance, &config);
            assert!(out.command.left.abs() <= config.max_speed);
            assert!(out.command.right.abs() <= config.max_speed);
        }
    }
}
