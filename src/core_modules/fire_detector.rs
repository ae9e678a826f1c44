// THEORY:
// The `fire_detector` is the engine of the visual perception layer. It
// implements a deterministic color-threshold classifier: every pixel of the
// frame is tested against a reference fire color, and the matches are reduced
// to a centroid and a match count.
//
// Key architectural principles:
// 1.  **Deterministic Classification**: A pixel is fire-colored iff its red
//     channel exceeds green by more than the configured margin AND all three
//     channels lie within a fixed tolerance of the reference color. There is
//     no learned model and no randomness; two calls with identical inputs
//     yield bit-identical results.
// 2.  **Ground-Plane Rejection**: When the nearest obstacle is still far away
//     (`current_distance` beyond the configured gate), the bottom rows of the
//     frame are skipped entirely. At long range anything fire-colored on the
//     ground plane is a reflection, and counting it would steer the robot at
//     the floor.
// 3.  **Centroid + Size Reduction**: The matches collapse into a
//     `DetectionResult`: the arithmetic-mean coordinate of all matching
//     pixels plus their count. The count doubles as a crude proximity proxy
//     for the navigator's "small signature" obstacle test.
// 4.  **Stateless Utility**: `scan_frame` is a pure function of the frame, the
//     current distance, and the config. It has no memory of previous frames.

use crate::pipeline::PipelineConfig;
use image::RgbImage;

/// The reduced output of one frame scan: whether a fire signature was seen,
/// where its center of mass lies, and how many pixels matched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionResult {
    /// True when at least one pixel matched the fire-color predicate.
    pub found: bool,
    /// Mean x coordinate of all matching pixels. Zero when `found` is false.
    pub centroid_x: f64,
    /// Mean y coordinate of all matching pixels. Zero when `found` is false.
    pub centroid_y: f64,
    /// Number of pixels that matched the fire-color predicate.
    pub pixel_count: u32,
}

impl DetectionResult {
    /// The "nothing seen" result, with every field at its defined zero.
    pub const NONE: DetectionResult = DetectionResult {
        found: false,
        centroid_x: 0.0,
        centroid_y: 0.0,
        pixel_count: 0,
    };
}

pub mod fire_detector {
    use super::*;

    /// The main function of the visual perception layer.
    /// Scans a frame for fire-colored pixels and reduces the matches to a
    /// centroid and a count.
    pub fn scan_frame(
        frame: &RgbImage,
        current_distance: f32,
        config: &PipelineConfig,
    ) -> DetectionResult {
        let ground_cutoff = f64::from(frame.height()) * config.ground_reject_row_fraction;
        let reject_ground = current_distance > config.ground_reject_min_distance;

        let mut fire_pixels: u32 = 0;
        let mut sum_x = 0.0_f64;
        let mut sum_y = 0.0_f64;

        for (x, y, pixel) in frame.enumerate_pixels() {
            // Ignore the ground plane while the target is still far away.
            if reject_ground && f64::from(y) > ground_cutoff {
                continue;
            }

            if is_fire_colored(pixel, config) {
                fire_pixels += 1;
                sum_x += f64::from(x);
                sum_y += f64::from(y);
            }
        }

        if fire_pixels == 0 {
            return DetectionResult::NONE;
        }

        DetectionResult {
            found: true,
            centroid_x: sum_x / f64::from(fire_pixels),
            centroid_y: sum_y / f64::from(fire_pixels),
            pixel_count: fire_pixels,
        }
    }

    /// The fire-color predicate applied to a single pixel.
    fn is_fire_colored(pixel: &image::Rgb<u8>, config: &PipelineConfig) -> bool {
        let r = i32::from(pixel.0[0]);
        let g = i32::from(pixel.0[1]);
        let b = i32::from(pixel.0[2]);

        let [fire_r, fire_g, fire_b] = config.fire_color;

        r > g + config.red_green_margin
            && (r - i32::from(fire_r)).abs() < config.color_tolerance
            && (g - i32::from(fire_g)).abs() < config.color_tolerance
            && (b - i32::from(fire_b)).abs() < config.color_tolerance
    }
}
