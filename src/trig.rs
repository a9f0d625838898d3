use std::f64::consts::PI;

pub fn deg_to_rad(deg: f64) -> f64 {
    deg * (PI / 180.0)
}

/// Wraps a compass bearing in degrees into `[0, 360)`.
pub fn normalize_bearing(deg: f64) -> f64 {
    deg.rem_euclid(360.0)
}
