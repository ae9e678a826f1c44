// THEORY:
// The `motor` module defines the single actuation primitive of the engine: one
// wheel-speed pair for a two-wheel differential drive. It is deliberately the
// smallest layer in the stack.
//
// Key architectural principles:
// 1.  **Dumb Data Container**: Like the sensor-side value types, `MotorCommand`
//     is a plain container. It carries no device handles and performs no I/O;
//     the host owns the actual motors and consumes one command per tick.
// 2.  **Universal Clamp**: Every command the navigator emits is built through
//     `MotorCommand::clamped`, which bounds both wheels to
//     `[-max_speed, +max_speed]`. The navigation states mostly emit in-range
//     values already, but the clamp is the single place where the bound is
//     guaranteed.
// 3.  **Fresh Per Tick**: A command is produced fresh every tick and is
//     immediately consumed by the drive. Nothing downstream retains it except
//     the pipeline's one-deep hold buffer for sensor-dropout ticks.

/// One wheel-speed pair for a two-wheel differential drive, in rad/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotorCommand {
    /// Angular velocity commanded for the left wheel.
    pub left: f64,
    /// Angular velocity commanded for the right wheel.
    pub right: f64,
}

impl MotorCommand {
    /// The halt command. Always in range for any non-negative speed limit.
    pub const STOP: MotorCommand = MotorCommand {
        left: 0.0,
        right: 0.0,
    };

    /// Builds a command with both wheels bounded to `[-max_speed, +max_speed]`.
    pub fn clamped(left: f64, right: f64, max_speed: f64) -> Self {
        Self {
            left: left.clamp(-max_speed, max_speed),
            right: right.clamp(-max_speed, max_speed),
        }
    }

    /// True when both wheels are commanded to zero.
    pub fn is_stop(&self) -> bool {
        self.left == 0.0 && self.right == 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_bounds_both_wheels() {
        let cmd = MotorCommand::clamped(10.0, -10.0, 3.0);
        assert_eq!(cmd.left, 3.0);
        assert_eq!(cmd.right, -3.0);
    }

    #[test]
    fn clamp_passes_in_range_values_through() {
        let cmd = MotorCommand::clamped(-0.5, 0.5, 3.0);
        assert_eq!(cmd.left, -0.5);
        assert_eq!(cmd.right, 0.5);
    }

    #[test]
    fn stop_is_stop() {
        assert!(MotorCommand::STOP.is_stop());
        assert!(!MotorCommand::clamped(1.0, 1.0, 3.0).is_stop());
    }
}
