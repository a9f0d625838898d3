pub mod color_relief;
pub mod compositing;
pub mod dem_tile;
pub mod errors;
pub mod grid;
pub mod hillshading;
pub mod mosaic;
pub mod multiband;
pub mod pipeline;
pub mod raster_io;
pub mod testing;
pub mod tiles;
pub mod trig;

pub use errors::{ColshadeError, Result};
pub use grid::{GeoReference, Grid, PixelSpacing, Sample};
pub use multiband::MultiBandGrid;
