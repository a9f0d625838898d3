//! The complete tiles-to-relief run: mosaic, shade, colorize, composite.

use crate::color_relief::{colorize, Palette};
use crate::compositing::composite;
use crate::errors::Result;
use crate::hillshading::{compute_illumination, IlluminationParameters};
use crate::mosaic::mosaic;
use crate::raster_io::{read_elevation, write_elevation, write_gray16, write_rgb16, write_rgb8};
use crate::tiles::collect_files;
use std::path::PathBuf;
use tracing::info;

pub const MERGED_FILE_NAME: &str = "merged.tif";
pub const HILLSHADE_FILE_NAME: &str = "hillshade.tif";
pub const COLOR_RELIEF_FILE_NAME: &str = "col_relief.tif";

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the elevation tiles.
    pub input_dir: PathBuf,
    /// Extension of the tiles to pick up, e.g. `tif` or `hgt`.
    pub extension: String,
    /// Directory receiving intermediate and final rasters.
    pub work_dir: PathBuf,
    /// File name of the final relief inside `work_dir`.
    pub output_name: String,
    pub palette: PathBuf,
    pub illumination: IlluminationParameters,
    /// Optional 16-bit PNG quick-look of the final relief.
    pub preview_png: Option<PathBuf>,
}

/// Paths of the rasters written by [`run`].
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutputs {
    pub merged: PathBuf,
    pub hillshade: PathBuf,
    pub color_relief: PathBuf,
    pub result: PathBuf,
}

struct Steps {
    current: usize,
}

impl Steps {
    fn start(&mut self, description: &str) {
        info!(step = self.current, "{}", description);
        self.current += 1;
    }
}

/// Runs every step in order, stopping at the first failure.
pub fn run(config: &PipelineConfig) -> Result<PipelineOutputs> {
    config.illumination.validate()?;
    let palette = Palette::from_file(&config.palette)?;
    std::fs::create_dir_all(&config.work_dir)?;

    let outputs = PipelineOutputs {
        merged: config.work_dir.join(MERGED_FILE_NAME),
        hillshade: config.work_dir.join(HILLSHADE_FILE_NAME),
        color_relief: config.work_dir.join(COLOR_RELIEF_FILE_NAME),
        result: config.work_dir.join(&config.output_name),
    };
    let mut steps = Steps { current: 1 };

    steps.start("collecting raster data");
    let files = collect_files(&config.input_dir, &config.extension)?;

    steps.start("mosaicking");
    let tiles = files
        .iter()
        .map(|file| read_elevation(file))
        .collect::<Result<Vec<_>>>()?;
    let merged = mosaic(&tiles)?;
    drop(tiles);
    write_elevation(&outputs.merged, &merged)?;
    info!(width = merged.width(), height = merged.height(), "mosaic done");

    steps.start("generating hillshade");
    let hillshade = compute_illumination(&merged, &config.illumination)?;
    write_gray16(&outputs.hillshade, &hillshade)?;

    steps.start("colorizing elevations");
    let relief = colorize(&merged, &palette)?;
    drop(merged);
    write_rgb8(&outputs.color_relief, &relief)?;

    steps.start("combining hillshade and color relief");
    let result = composite(&relief, &hillshade)?;
    write_rgb16(&outputs.result, &result)?;

    if let Some(preview) = &config.preview_png {
        result.write_to_png(&preview.to_string_lossy())?;
        info!(path = %preview.display(), "wrote preview");
    }

    info!(
        merged = %outputs.merged.display(),
        hillshade = %outputs.hillshade.display(),
        color_relief = %outputs.color_relief.display(),
        result = %outputs.result.display(),
        "process finished"
    );

    Ok(outputs)
}
