// THEORY:
// The `range_finder` is the engine of the obstacle-distance layer. It reduces a
// full horizontal range scan to the single number the navigator actually
// consumes: the nearest valid return inside a forward cone.
//
// Key architectural principles:
// 1.  **Forward Cone**: Only the central 40% of the scan (index range 30% to
//     70% of the sample count) participates. Peripheral returns come from
//     walls the robot is driving past, not from anything in its path, and
//     including them would stall the approach constantly.
// 2.  **Noise Floor**: Samples at or below `NOISE_FLOOR` are self-returns and
//     sensor noise, never real geometry, and are discarded before the minimum
//     is taken.
// 3.  **Infinity as "No Obstacle"**: A scan with no qualifying sample reduces
//     to `f32::INFINITY` rather than an error. Infinity fails every
//     `< threshold` comparison downstream, so "nothing in the cone" flows
//     through the state machine with no special casing.
// 4.  **Stateless Utility**: `min_forward_distance` is a pure function of one
//     scan. It has no memory of previous ticks.

pub mod range_finder {
    /// Fraction of the scan width where the forward cone begins.
    pub const CONE_START_FRACTION: f32 = 0.3;
    /// Fraction of the scan width where the forward cone ends.
    pub const CONE_END_FRACTION: f32 = 0.7;
    /// Returns at or below this value are treated as sensor noise, in meters.
    pub const NOISE_FLOOR: f32 = 0.05;

    /// Reduces a range scan to the minimum valid distance in the forward cone.
    /// Returns `f32::INFINITY` when no sample in the cone clears the noise floor.
    pub fn min_forward_distance(scan: &[f32]) -> f32 {
        let start = (scan.len() as f32 * CONE_START_FRACTION) as usize;
        let end = (scan.len() as f32 * CONE_END_FRACTION) as usize;

        let mut min_distance = f32::INFINITY;
        for &sample in &scan[start..end] {
            if sample > NOISE_FLOOR && sample < min_distance {
                min_distance = sample;
            }
        }
        min_distance
    }
}
