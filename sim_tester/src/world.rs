// THEORY:
// The `world` module is a deliberately small stand-in for the simulation host
// the engine normally runs against. It owns a toy 2-D world (one robot, one
// fire, one obstacle), renders the camera frame and the range scan the
// pipeline consumes, integrates wheel commands into the robot pose, and
// honors the one-shot extinguish mutation.
//
// It emulates sensors the way the pack's reference harnesses do: plausible
// synthetic readings with a little seeded noise, not physical accuracy. The
// point is a closed loop the engine can actually drive to completion.

use image::{Rgb, RgbImage};
use pyro_nav::pipeline::MotorCommand;
use rand::Rng;
use rand::rngs::StdRng;

/// Host tick length in seconds (the original controller ran at 64 ms).
const TIME_STEP: f64 = 0.064;
/// Wheel radius in meters.
const WHEEL_RADIUS: f64 = 0.0975;
/// Distance between the wheels in meters.
const AXLE_LENGTH: f64 = 0.33;
/// Number of samples per range scan.
const SCAN_RESOLUTION: usize = 64;
/// Horizontal field of view of the range sensor, in radians.
const SCAN_FOV: f64 = std::f64::consts::FRAC_PI_2;
/// Horizontal field of view of the camera, in radians.
const CAMERA_FOV: f64 = 1.0;
/// Radius of the fire, as seen by both sensors, in meters.
const FIRE_RADIUS: f64 = 0.30;
/// Radius of the obstacle, in meters.
const OBSTACLE_RADIUS: f64 = 0.25;
/// Range sensor noise amplitude, in meters.
const SCAN_NOISE: f32 = 0.01;

/// Robot pose in world coordinates.
#[derive(Debug, Clone, Copy)]
pub struct Pose {
    pub x: f64,
    pub y: f64,
    pub heading: f64,
}

/// The toy world: one robot, one fire, one obstacle between them.
pub struct SimWorld {
    pub robot: Pose,
    /// The fire's world position; `None` once extinguished or never placed.
    pub fire: Option<(f64, f64)>,
    pub obstacle: (f64, f64),
    frame_width: u32,
    frame_height: u32,
    fire_color: [u8; 3],
    rng: StdRng,
}

impl SimWorld {
    pub fn new(
        frame_width: u32,
        frame_height: u32,
        fire_color: [u8; 3],
        with_fire: bool,
        rng: StdRng,
    ) -> Self {
        Self {
            robot: Pose {
                x: 0.0,
                y: 0.0,
                heading: 0.0,
            },
            // The fire sits well ahead of the robot, the obstacle roughly on
            // the straight-line path so the avoidance sequence gets exercised.
            fire: with_fire.then_some((6.0, 1.5)),
            obstacle: (3.0, 0.8),
            frame_width,
            frame_height,
            fire_color,
            rng,
        }
    }

    /// Renders the camera frame for the current pose.
    pub fn render(&mut self) -> RgbImage {
        let mut frame = RgbImage::from_fn(self.frame_width, self.frame_height, |_, y| {
            // Flat backdrop: dark wall above the horizon, gray floor below.
            if y < self.frame_height / 2 {
                Rgb([38, 36, 40])
            } else {
                Rgb([70, 68, 66])
            }
        });

        let Some((fx, fy)) = self.fire else {
            return frame;
        };

        let dx = fx - self.robot.x;
        let dy = fy - self.robot.y;
        let distance = (dx * dx + dy * dy).sqrt();
        let bearing = wrap_angle(dy.atan2(dx) - self.robot.heading);
        if bearing.abs() > CAMERA_FOV / 2.0 || distance < 1e-3 {
            return frame;
        }

        // Pinhole projection of the blob center and its apparent radius.
        let width = f64::from(self.frame_width);
        let center_u = (0.5 - bearing / CAMERA_FOV) * width;
        let center_v = f64::from(self.frame_height) * 0.5;
        let focal = width / (2.0 * (CAMERA_FOV / 2.0).tan());
        let radius_px = ((FIRE_RADIUS / distance) * focal).min(width / 2.0);

        let [r, g, b] = self.fire_color;
        for py in 0..self.frame_height {
            for px in 0..self.frame_width {
                let du = f64::from(px) - center_u;
                let dv = f64::from(py) - center_v;
                if du * du + dv * dv <= radius_px * radius_px {
                    // Flicker the blob slightly; stays well inside the
                    // detector's color tolerance.
                    let jitter = self.rng.gen_range(-10i16..=10);
                    frame.put_pixel(
                        px,
                        py,
                        Rgb([
                            shift_channel(r, jitter),
                            shift_channel(g, jitter),
                            shift_channel(b, jitter),
                        ]),
                    );
                }
            }
        }

        frame
    }

    /// Produces the range scan for the current pose. Samples sweep the
    /// sensor's field of view left to right; rays that hit nothing report
    /// infinity.
    pub fn scan(&mut self) -> Vec<f32> {
        let mut samples = Vec::with_capacity(SCAN_RESOLUTION);
        for i in 0..SCAN_RESOLUTION {
            let t = (i as f64 + 0.5) / SCAN_RESOLUTION as f64;
            let angle = self.robot.heading + (0.5 - t) * SCAN_FOV;

            let mut range = self.ray_to_circle(angle, self.obstacle, OBSTACLE_RADIUS);
            if let Some(fire) = self.fire {
                range = range.min(self.ray_to_circle(angle, fire, FIRE_RADIUS));
            }

            if range.is_finite() {
                range += f64::from(self.rng.gen_range(-SCAN_NOISE..=SCAN_NOISE));
            }
            samples.push(range.max(0.0) as f32);
        }
        samples
    }

    /// Integrates one wheel command over a tick of differential-drive
    /// kinematics.
    pub fn apply(&mut self, command: MotorCommand) {
        let v = WHEEL_RADIUS * (command.left + command.right) / 2.0;
        let w = WHEEL_RADIUS * (command.right - command.left) / AXLE_LENGTH;

        self.robot.heading = wrap_angle(self.robot.heading + w * TIME_STEP);
        self.robot.x += v * TIME_STEP * self.robot.heading.cos();
        self.robot.y += v * TIME_STEP * self.robot.heading.sin();
    }

    /// The one-shot world mutation: removes the fire object.
    pub fn extinguish(&mut self) {
        self.fire = None;
    }

    /// Straight-line distance from the robot to the fire, if one remains.
    pub fn distance_to_fire(&self) -> Option<f64> {
        self.fire.map(|(fx, fy)| {
            let dx = fx - self.robot.x;
            let dy = fy - self.robot.y;
            (dx * dx + dy * dy).sqrt()
        })
    }

    /// Distance along a ray from the robot pose to a circle, or infinity.
    fn ray_to_circle(&self, angle: f64, center: (f64, f64), radius: f64) -> f64 {
        let (cx, cy) = center;
        let ox = cx - self.robot.x;
        let oy = cy - self.robot.y;
        let (dir_x, dir_y) = (angle.cos(), angle.sin());

        let along = ox * dir_x + oy * dir_y;
        if along <= 0.0 {
            return f64::INFINITY;
        }
        let closest_sq = (ox * ox + oy * oy) - along * along;
        if closest_sq >= radius * radius {
            return f64::INFINITY;
        }
        along - (radius * radius - closest_sq).sqrt()
    }
}

/// Wraps an angle to `(-PI, PI]`.
fn wrap_angle(mut angle: f64) -> f64 {
    while angle > std::f64::consts::PI {
        angle -= 2.0 * std::f64::consts::PI;
    }
    while angle <= -std::f64::consts::PI {
        angle += 2.0 * std::f64::consts::PI;
    }
    angle
}

/// Shifts a channel by a signed jitter, saturating at the u8 bounds.
fn shift_channel(channel: u8, jitter: i16) -> u8 {
    (i16::from(channel) + jitter).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn world(with_fire: bool) -> SimWorld {
        SimWorld::new(128, 128, [251, 72, 15], with_fire, StdRng::seed_from_u64(7))
    }

    #[test]
    fn fire_ahead_shows_up_in_the_frame() {
        let mut world = world(true);
        // Face the fire directly.
        world.robot.heading = (1.5_f64).atan2(6.0);
        let frame = world.render();
        let fire_pixels = frame
            .pixels()
            .filter(|p| p.0[0] > 200 && p.0[1] < 120)
            .count();
        assert!(fire_pixels > 0);
    }

    #[test]
    fn extinguished_world_renders_no_fire() {
        let mut world = world(true);
        world.robot.heading = (1.5_f64).atan2(6.0);
        world.extinguish();
        let frame = world.render();
        let fire_pixels = frame
            .pixels()
            .filter(|p| p.0[0] > 200 && p.0[1] < 120)
            .count();
        assert_eq!(fire_pixels, 0);
    }

    #[test]
    fn scan_sees_the_obstacle_when_facing_it() {
        let mut world = world(false);
        world.robot.heading = (0.8_f64).atan2(3.0);
        let scan = world.scan();
        let min = scan.iter().cloned().fold(f32::INFINITY, f32::min);
        assert!(min.is_finite());
        // Center-to-center distance minus the obstacle radius, within noise.
        let expected = (3.0_f64.powi(2) + 0.8_f64.powi(2)).sqrt() - OBSTACLE_RADIUS;
        assert!((f64::from(min) - expected).abs() < 0.05);
    }

    #[test]
    fn equal_wheel_speeds_drive_straight() {
        let mut world = world(false);
        for _ in 0..10 {
            world.apply(MotorCommand { left: 3.0, right: 3.0 });
        }
        assert!(world.robot.x > 0.1);
        assert!(world.robot.y.abs() < 1e-9);
        assert!(world.robot.heading.abs() < 1e-9);
    }

    #[test]
    fn opposite_wheel_speeds_spin_in_place() {
        let mut world = world(false);
        for _ in 0..10 {
            world.apply(MotorCommand {
                left: -1.0,
                right: 1.0,
            });
        }
        assert!(world.robot.x.abs() < 1e-9);
        assert!(world.robot.heading > 0.0);
    }
}
