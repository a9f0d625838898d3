//! Merging georeferenced elevation tiles into one grid.

use crate::errors::{ColshadeError, Result};
use crate::grid::{GeoReference, Grid, PixelSpacing};
use tracing::debug;

/// Relative tolerance when comparing pixel spacings.
const SPACING_TOLERANCE: f64 = 1e-9;

fn same_spacing(a: &PixelSpacing, b: &PixelSpacing) -> bool {
    let close = |a: f64, b: f64| (a - b).abs() <= SPACING_TOLERANCE * a.abs().max(b.abs());
    close(a.x, b.x) && close(a.y, b.y)
}

struct Bounds {
    min_x: f64,
    max_x: f64,
    min_y: f64,
    max_y: f64,
}

impl Bounds {
    fn of(grid: &Grid<f32>, georeference: &GeoReference) -> Bounds {
        Bounds {
            min_x: georeference.origin_x,
            max_x: georeference.origin_x + grid.width() as f64 * grid.spacing.x,
            min_y: georeference.origin_y - grid.height() as f64 * grid.spacing.y,
            max_y: georeference.origin_y,
        }
    }

    fn union(self, other: Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            max_x: self.max_x.max(other.max_x),
            min_y: self.min_y.min(other.min_y),
            max_y: self.max_y.max(other.max_y),
        }
    }
}

/// Merges tiles sharing one pixel grid into a single elevation grid.
///
/// Tiles are placed by their georeference; where tiles overlap the later
/// tile wins. The result takes the first tile's no-data value. Source
/// no-data cells never overwrite a sample, and cells that no tile covers hold
/// the no-data value (0 when the first tile has none). Tiles must all have
/// the same pixel spacing; nothing is resampled.
pub fn mosaic(tiles: &[Grid<f32>]) -> Result<Grid<f32>> {
    let first = tiles.first().ok_or_else(|| {
        ColshadeError::InvalidGeometry("no tiles to mosaic".to_string())
    })?;
    let spacing = first.spacing;

    let mut placed = Vec::with_capacity(tiles.len());
    for tile in tiles {
        if !same_spacing(&spacing, &tile.spacing) {
            return Err(ColshadeError::ResolutionMismatch {
                first: (spacing.x, spacing.y),
                other: (tile.spacing.x, tile.spacing.y),
            });
        }

        let georeference = match (&tile.georeference, tiles.len()) {
            (Some(georeference), _) => georeference.clone(),
            (None, 1) => GeoReference::default(),
            (None, _) => {
                return Err(ColshadeError::InvalidGeometry(
                    "tiles without georeference cannot be mosaicked".to_string(),
                ))
            }
        };
        placed.push((tile, georeference));
    }

    let bounds = placed
        .iter()
        .map(|(tile, georeference)| Bounds::of(tile, georeference))
        .reduce(Bounds::union)
        .ok_or_else(|| ColshadeError::InvalidGeometry("no tiles to mosaic".to_string()))?;

    let width = ((bounds.max_x - bounds.min_x) / spacing.x).round() as usize;
    let height = ((bounds.max_y - bounds.min_y) / spacing.y).round() as usize;
    debug!(tiles = tiles.len(), width, height, "mosaicking tiles");

    let fill = first.nodata.map_or(0., |nodata| nodata as f32);
    let mut merged = Grid::filled(width, height, spacing, fill)?;
    merged.nodata = first.nodata;

    for (tile, georeference) in &placed {
        let col_offset =
            ((georeference.origin_x - bounds.min_x) / spacing.x).round() as usize;
        let row_offset =
            ((bounds.max_y - georeference.origin_y) / spacing.y).round() as usize;

        for (y, row) in tile.rows().enumerate() {
            for (x, value) in row.iter().enumerate() {
                let (mx, my) = (col_offset + x, row_offset + y);
                if mx < width && my < height && !tile.is_nodata(*value) {
                    merged.set_pixel(mx, my, *value);
                }
            }
        }
    }

    merged.georeference = first.georeference.as_ref().map(|georeference| {
        GeoReference {
            origin_x: bounds.min_x,
            origin_y: bounds.max_y,
            ..georeference.clone()
        }
    });

    Ok(merged)
}
