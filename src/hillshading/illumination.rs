use crate::errors::{ColshadeError, Result};
use crate::grid::{Grid, Sample};
use crate::hillshading::gradient::gradient_at;
use crate::hillshading::parameters::IlluminationParameters;
use crate::trig::{deg_to_rad, normalize_bearing};
use rayon::prelude::*;
use std::f64::consts::FRAC_PI_2;
use tracing::debug;

/// Nominal brightness ceiling of the illumination domain.
pub const FULL_BRIGHTNESS: f64 = 255.0;

/// Light direction terms that stay constant over the whole grid.
#[derive(Debug, Clone, Copy)]
pub struct LightSource {
    sin_altitude: f64,
    cos_altitude: f64,
    /// Light bearing in the model's counter-clockwise convention, shifted
    /// by a quarter turn so it lines up with `aspect`.
    bearing: f64,
}

impl LightSource {
    pub fn new(parameters: &IlluminationParameters) -> LightSource {
        let altitude = deg_to_rad(parameters.altitude);
        let azimuth = deg_to_rad(360.0 - normalize_bearing(parameters.azimuth));

        LightSource {
            sin_altitude: altitude.sin(),
            cos_altitude: altitude.cos(),
            bearing: azimuth - FRAC_PI_2,
        }
    }
}

/// Calculates the slope and aspect (both in radians) from the row-axis and
/// column-axis gradient. The slope is measured so that flat ground is π/2.
pub fn calculate_slope_and_aspect(dz_drow: f64, dz_dcol: f64) -> (f64, f64) {
    let slope =
        FRAC_PI_2 - (dz_drow * dz_drow + dz_dcol * dz_dcol).sqrt().atan();
    let aspect = (-dz_drow).atan2(dz_dcol);

    (slope, aspect)
}

/// Brightness of a single pixel for the given gradient.
///
/// The cosine between surface normal and light, in `[-1, 1]`, is remapped to
/// `[0, 1]` and scaled to [`FULL_BRIGHTNESS`]. The result is not clamped.
pub fn illumination_at(dz_drow: f64, dz_dcol: f64, light: &LightSource) -> f64 {
    let (slope, aspect) = calculate_slope_and_aspect(dz_drow, dz_dcol);

    FULL_BRIGHTNESS
        * (light.sin_altitude * slope.sin()
            + light.cos_altitude * slope.cos() * (light.bearing - aspect).cos()
            + 1.)
        / 2.
}

/// Computes the shaded-relief illumination grid of an elevation grid.
///
/// The output has the elevation grid's size and georeference. Samples are
/// the computed brightness rounded to the nearest integer.
pub fn compute_illumination(
    elevation: &Grid<f32>,
    parameters: &IlluminationParameters,
) -> Result<Grid<u16>> {
    if elevation.width() == 0 || elevation.height() == 0 {
        return Err(ColshadeError::InvalidGeometry(format!(
            "elevation grid {}x{} is empty",
            elevation.width(),
            elevation.height()
        )));
    }
    parameters.validate()?;

    debug!(
        width = elevation.width(),
        height = elevation.height(),
        azimuth = parameters.azimuth,
        altitude = parameters.altitude,
        z_factor = parameters.z_factor,
        "computing illumination"
    );

    let light = LightSource::new(parameters);
    let width = elevation.width();
    let mut shade = vec![0u16; width * elevation.height()];

    // pixels are independent, so rows can be shaded in any order
    shade
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, sample) in row.iter_mut().enumerate() {
                let (dz_drow, dz_dcol) =
                    gradient_at(elevation, x, y, parameters.z_factor);
                *sample = u16::from_f64(illumination_at(dz_drow, dz_dcol, &light));
            }
        });

    Ok(elevation.derive(shade))
}
