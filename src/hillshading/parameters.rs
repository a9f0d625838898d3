use crate::errors::{ColshadeError, Result};

/// Lighting setup for the illumination model.
///
/// `azimuth` is the compass bearing of the light in degrees (0 = north,
/// clockwise) and is taken modulo 360. `altitude` is the light's angle above
/// the horizon in degrees, within `[0, 90]`. `z_factor` converts elevation
/// units into the grid's horizontal units and must be positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IlluminationParameters {
    pub azimuth: f64,
    pub altitude: f64,
    pub z_factor: f64,
}

/// Meters-to-degrees approximation used for geographic (lon/lat) DEMs.
pub const DEFAULT_Z_FACTOR: f64 = 0.00001;

impl Default for IlluminationParameters {
    fn default() -> Self {
        Self {
            azimuth: 315.0,
            altitude: 45.0,
            z_factor: DEFAULT_Z_FACTOR,
        }
    }
}

impl IlluminationParameters {
    pub fn new(
        azimuth: f64,
        altitude: f64,
        z_factor: f64,
    ) -> Result<IlluminationParameters> {
        let parameters = Self {
            azimuth,
            altitude,
            z_factor,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.azimuth.is_finite() {
            return Err(ColshadeError::invalid_parameter(
                "azimuth",
                self.azimuth,
                "must be a finite bearing",
            ));
        }

        if !(0.0..=90.0).contains(&self.altitude) {
            return Err(ColshadeError::invalid_parameter(
                "altitude",
                self.altitude,
                "must be within [0, 90] degrees",
            ));
        }

        if !self.z_factor.is_finite() || self.z_factor <= 0.0 {
            return Err(ColshadeError::invalid_parameter(
                "z_factor",
                self.z_factor,
                "must be positive",
            ));
        }

        Ok(())
    }
}
