//! Shade-multiply blending of an illumination grid into color bands.

use crate::errors::{ColshadeError, Result};
use crate::grid::{Grid, Sample};
use crate::hillshading::FULL_BRIGHTNESS;
use crate::multiband::MultiBandGrid;
use rayon::prelude::*;
use tracing::debug;

/// Darkens (or brightens) every color band by the illumination at each
/// pixel: `out = illumination / 255 * color`.
///
/// The divisor is the nominal brightness ceiling, not the observed maximum
/// of the illumination grid. Results are rounded into 16-bit samples; band
/// count and order are kept. The output takes the illumination grid's
/// georeference.
pub fn composite<T: Sample>(
    color: &MultiBandGrid<T>,
    illumination: &Grid<u16>,
) -> Result<MultiBandGrid<u16>> {
    if color.band_count() == 0 {
        return Err(ColshadeError::EmptyInput);
    }

    if color.width() != illumination.width()
        || color.height() != illumination.height()
    {
        return Err(ColshadeError::DimensionMismatch {
            expected_width: illumination.width(),
            expected_height: illumination.height(),
            actual_width: color.width(),
            actual_height: color.height(),
        });
    }

    debug!(
        bands = color.band_count(),
        width = illumination.width(),
        height = illumination.height(),
        "compositing color relief with illumination"
    );

    let bands = color
        .bands()
        .iter()
        .map(|band| {
            let blended: Vec<u16> = band
                .data()
                .par_iter()
                .zip(illumination.data().par_iter())
                .map(|(c, shade)| {
                    u16::from_f64(*shade as f64 / FULL_BRIGHTNESS * c.to_f64())
                })
                .collect();
            illumination.derive(blended)
        })
        .collect();

    MultiBandGrid::new(bands)
}
