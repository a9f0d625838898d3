//! Reading elevation tiles and writing GeoTIFF results.
//!
//! Georeferencing uses the ModelPixelScale and ModelTiepoint tags. The GeoKey
//! directory and its parameter tags are not interpreted, only copied from
//! source to output so the output keeps the source's spatial reference.

use crate::dem_tile::read_hgt_file;
use crate::errors::{ColshadeError, Result};
use crate::grid::{GeoReference, Grid, PixelSpacing, Sample};
use crate::multiband::MultiBandGrid;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;
use tiff::decoder::{Decoder, DecodingResult};
use tiff::encoder::colortype::{self, ColorType as EncoderColorType};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

const MODEL_PIXEL_SCALE_TAG: u16 = 33550;
const MODEL_TIEPOINT_TAG: u16 = 33922;
const GEO_KEY_DIRECTORY_TAG: u16 = 34735;
const GEO_DOUBLE_PARAMS_TAG: u16 = 34736;
const GEO_ASCII_PARAMS_TAG: u16 = 34737;
const GDAL_NODATA_TAG: u16 = 42113;

fn tag(code: u16) -> Tag {
    Tag::from_u16_exhaustive(code)
}

/// Reads an elevation tile, choosing the decoder by file extension.
pub fn read_elevation(path: &Path) -> Result<Grid<f32>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase());

    match extension.as_deref() {
        Some("hgt") => read_hgt_file(path),
        Some("tif") | Some("tiff") => read_geotiff(path),
        _ => Err(ColshadeError::UnsupportedFormat {
            path: path.to_path_buf(),
            reason: "expected a .tif, .tiff or .hgt file".to_string(),
        }),
    }
}

/// Reads the first band of a single-band GeoTIFF as elevations.
pub fn read_geotiff(path: &Path) -> Result<Grid<f32>> {
    let file = File::open(path)?;
    decode_geotiff(BufReader::new(file)).map_err(|e| match e {
        ColshadeError::UnsupportedFormat { reason, .. } => {
            ColshadeError::UnsupportedFormat {
                path: path.to_path_buf(),
                reason,
            }
        }
        other => other,
    })
}

/// Decodes a single-band GeoTIFF from any seekable source.
pub fn decode_geotiff<R: Read + Seek>(reader: R) -> Result<Grid<f32>> {
    let mut decoder = Decoder::new(reader)?;

    let color_type = decoder.colortype()?;
    if !matches!(color_type, ColorType::Gray(_)) {
        return Err(ColshadeError::UnsupportedFormat {
            path: Default::default(),
            reason: format!("expected a single band, got {:?}", color_type),
        });
    }

    let (width, height) = decoder.dimensions()?;

    let heights: Vec<f32> = match decoder.read_image()? {
        DecodingResult::U8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::U32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::I8(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I16(buf) => buf.into_iter().map(f32::from).collect(),
        DecodingResult::I32(buf) => buf.into_iter().map(|v| v as f32).collect(),
        DecodingResult::F32(buf) => buf,
        DecodingResult::F64(buf) => buf.into_iter().map(|v| v as f32).collect(),
        _ => {
            return Err(ColshadeError::UnsupportedFormat {
                path: Default::default(),
                reason: "64-bit integer samples are not supported".to_string(),
            })
        }
    };

    let scale = decoder.get_tag_f64_vec(tag(MODEL_PIXEL_SCALE_TAG)).ok();
    let tiepoint = decoder.get_tag_f64_vec(tag(MODEL_TIEPOINT_TAG)).ok();

    let (spacing, georeference) = match (scale, tiepoint) {
        (Some(scale), Some(tiepoint))
            if scale.len() >= 2 && tiepoint.len() >= 6 =>
        {
            // tiepoint: raster (I, J, K) -> model (X, Y, Z)
            let origin_x = tiepoint[3] - tiepoint[0] * scale[0];
            let origin_y = tiepoint[4] + tiepoint[1] * scale[1];
            let georeference = GeoReference {
                origin_x,
                origin_y,
                geo_key_directory: decoder
                    .get_tag_u16_vec(tag(GEO_KEY_DIRECTORY_TAG))
                    .ok(),
                geo_double_params: decoder
                    .get_tag_f64_vec(tag(GEO_DOUBLE_PARAMS_TAG))
                    .ok(),
                geo_ascii_params: decoder
                    .get_tag_ascii_string(tag(GEO_ASCII_PARAMS_TAG))
                    .ok(),
            };
            (PixelSpacing::new(scale[0], scale[1]), Some(georeference))
        }
        _ => (PixelSpacing::unit(), None),
    };

    let nodata = decoder
        .get_tag_ascii_string(tag(GDAL_NODATA_TAG))
        .ok()
        .and_then(|text| text.trim_matches(|c: char| c == '\0' || c.is_whitespace()).parse::<f64>().ok());

    debug!(width, height, ?spacing, ?nodata, "decoded GeoTIFF");

    let mut grid =
        Grid::from_vec(width as usize, height as usize, spacing, heights)?;
    grid.georeference = georeference;
    grid.nodata = nodata;
    Ok(grid)
}

fn write_georeference<W: Write + Seek, K: TiffKind>(
    directory: &mut DirectoryEncoder<'_, W, K>,
    spacing: &PixelSpacing,
    georeference: Option<&GeoReference>,
    nodata: Option<f64>,
) -> Result<()> {
    if let Some(georeference) = georeference {
        let scale = [spacing.x, spacing.y, 0.0];
        directory.write_tag(tag(MODEL_PIXEL_SCALE_TAG), &scale[..])?;

        let tiepoint =
            [0.0, 0.0, 0.0, georeference.origin_x, georeference.origin_y, 0.0];
        directory.write_tag(tag(MODEL_TIEPOINT_TAG), &tiepoint[..])?;

        if let Some(keys) = &georeference.geo_key_directory {
            directory.write_tag(tag(GEO_KEY_DIRECTORY_TAG), keys.as_slice())?;
        }
        if let Some(params) = &georeference.geo_double_params {
            directory.write_tag(tag(GEO_DOUBLE_PARAMS_TAG), params.as_slice())?;
        }
        if let Some(params) = &georeference.geo_ascii_params {
            directory.write_tag(tag(GEO_ASCII_PARAMS_TAG), params.as_str())?;
        }
    }

    if let Some(nodata) = nodata {
        directory.write_tag(tag(GDAL_NODATA_TAG), nodata.to_string().as_str())?;
    }

    Ok(())
}

/// Writes samples as a GeoTIFF, taking the georeference of `template`.
fn write_image<C, T>(
    path: &Path,
    template: &Grid<T>,
    nodata: Option<f64>,
    data: &[C::Inner],
) -> Result<()>
where
    C: EncoderColorType,
    [C::Inner]: TiffValue,
    T: Sample,
{
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder
        .new_image::<C>(template.width() as u32, template.height() as u32)?;

    write_georeference(
        image.encoder(),
        &template.spacing,
        template.georeference.as_ref(),
        nodata,
    )?;

    image.write_data(data)?;
    debug!(path = %path.display(), "wrote GeoTIFF");
    Ok(())
}

/// Writes an elevation grid as a 32-bit float GeoTIFF.
pub fn write_elevation(path: &Path, grid: &Grid<f32>) -> Result<()> {
    write_image::<colortype::Gray32Float, _>(path, grid, grid.nodata, grid.data())
}

/// Writes a single-band 16-bit GeoTIFF.
pub fn write_gray16(path: &Path, grid: &Grid<u16>) -> Result<()> {
    write_image::<colortype::Gray16, _>(path, grid, grid.nodata, grid.data())
}

fn require_rgb<T: Sample>(grid: &MultiBandGrid<T>) -> Result<()> {
    if grid.band_count() != 3 {
        return Err(ColshadeError::InvalidGeometry(format!(
            "an RGB GeoTIFF needs 3 bands, got {}",
            grid.band_count()
        )));
    }
    Ok(())
}

/// Writes a three-band 8-bit GeoTIFF.
pub fn write_rgb8(path: &Path, grid: &MultiBandGrid<u8>) -> Result<()> {
    require_rgb(grid)?;
    write_image::<colortype::RGB8, _>(path, grid.band(0), None, &grid.interleaved())
}

/// Writes a three-band 16-bit GeoTIFF.
pub fn write_rgb16(path: &Path, grid: &MultiBandGrid<u16>) -> Result<()> {
    require_rgb(grid)?;
    write_image::<colortype::RGB16, _>(path, grid.band(0), None, &grid.interleaved())
}
