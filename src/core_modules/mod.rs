pub mod fire_detector;
pub mod motor;
pub mod navigator;
pub mod range_finder;
