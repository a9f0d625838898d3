//! SRTM `.hgt` elevation tiles.

use crate::errors::{ColshadeError, Result};
use crate::grid::{GeoReference, Grid, PixelSpacing};
use byteorder::{BigEndian, ReadBytesExt};
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Value marking voids in SRTM tiles.
pub const HGT_NODATA: i16 = -32768;

/// GeoKey directory for WGS84 geographic coordinates, pixel-is-area.
const WGS84_GEO_KEYS: [u16; 16] = [
    1, 1, 0, 3, // version 1.1.0, 3 keys
    1024, 0, 1, 2, // GTModelTypeGeoKey = geographic
    1025, 0, 1, 1, // GTRasterTypeGeoKey = pixel is area
    2048, 0, 1, 4326, // GeographicTypeGeoKey = WGS84
];

/// The south-west corner of a one-degree DEM tile, as encoded in tile names
/// like `N46E006`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DemTileId {
    pub lon: i16,
    pub lat: i16,
}

impl DemTileId {
    pub fn new(lon: i16, lat: i16) -> Self {
        DemTileId { lon, lat }
    }
}

impl FromStr for DemTileId {
    type Err = String;

    fn from_str(tile_name: &str) -> std::result::Result<Self, Self::Err> {
        let tile_name = tile_name.to_uppercase();
        if tile_name.len() != 7 || !tile_name.is_ascii() {
            return Err(format!("Invalid tile ID: {}", tile_name));
        }

        let lat = tile_name[1..3]
            .parse::<i16>()
            .map_err(|e| format!("Failed to parse latitude: {}", e))?;
        let lon = tile_name[4..7]
            .parse::<i16>()
            .map_err(|e| format!("Failed to parse longitude: {}", e))?;

        let lat = match &tile_name[0..1] {
            "N" => lat,
            "S" => -lat,
            other => return Err(format!("Invalid hemisphere: {}", other)),
        };
        let lon = match &tile_name[3..4] {
            "E" => lon,
            "W" => -lon,
            other => return Err(format!("Invalid hemisphere: {}", other)),
        };

        Ok(DemTileId { lon, lat })
    }
}

impl fmt::Display for DemTileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:02}{}{:03}",
            if self.lat >= 0 { 'N' } else { 'S' },
            self.lat.abs(),
            if self.lon >= 0 { 'E' } else { 'W' },
            self.lon.abs()
        )
    }
}

/// Decodes the big-endian heights of a square tile covering `tile_id`.
pub fn decode_hgt(tile_id: DemTileId, bytes: &[u8]) -> Result<Grid<f32>> {
    let total_heights_count = bytes.len() / 2;
    let tile_size = (total_heights_count as f64).sqrt() as usize;
    if bytes.len() % 2 != 0
        || tile_size < 2
        || tile_size * tile_size != total_heights_count
    {
        return Err(ColshadeError::InvalidGeometry(format!(
            "HGT tile {} does not contain a square number of heights",
            tile_id
        )));
    }

    let mut reader = bytes;
    let mut heights = Vec::with_capacity(total_heights_count);
    for _ in 0..total_heights_count {
        heights.push(reader.read_i16::<BigEndian>()? as f32);
    }

    // neighbouring tiles share their edge rows, so the spacing is one
    // degree divided by size - 1 and pixel centers sit on the tile edges
    let spacing = 1.0 / (tile_size - 1) as f64;
    let georeference = GeoReference {
        origin_x: tile_id.lon as f64 - spacing / 2.,
        origin_y: tile_id.lat as f64 + 1. + spacing / 2.,
        geo_key_directory: Some(WGS84_GEO_KEYS.to_vec()),
        geo_double_params: None,
        geo_ascii_params: None,
    };

    debug!(tile = %tile_id, size = tile_size, "decoded HGT tile");

    Ok(Grid::from_vec(
        tile_size,
        tile_size,
        PixelSpacing::new(spacing, spacing),
        heights,
    )?
    .with_georeference(georeference)
    .with_nodata(HGT_NODATA as f64))
}

/// Reads an HGT file. The tile position comes from the file name.
pub fn read_hgt_file(path: &Path) -> Result<Grid<f32>> {
    let tile_id = path
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| unsupported(path, "missing file name".to_string()))?
        .parse::<DemTileId>()
        .map_err(|reason| unsupported(path, reason))?;

    let mut bytes = Vec::new();
    BufReader::new(File::open(path)?).read_to_end(&mut bytes)?;

    decode_hgt(tile_id, &bytes)
}

fn unsupported(path: &Path, reason: String) -> ColshadeError {
    ColshadeError::UnsupportedFormat {
        path: path.to_path_buf(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::assert_eq_approx;
    use byteorder::WriteBytesExt;
    use rstest::rstest;

    fn hgt_bytes(heights: &[i16]) -> Vec<u8> {
        let mut bytes = Vec::new();
        for h in heights {
            bytes.write_i16::<BigEndian>(*h).unwrap();
        }
        bytes
    }

    #[rstest]
    #[case("N46E006", 6, 46)]
    #[case("s12w077", -77, -12)]
    #[case("N00W001", -1, 0)]
    fn parses_tile_names(#[case] name: &str, #[case] lon: i16, #[case] lat: i16) {
        assert_eq!(name.parse::<DemTileId>().unwrap(), DemTileId::new(lon, lat));
    }

    #[rstest]
    #[case("N46E06")]
    #[case("X46E006")]
    #[case("N4xE006")]
    fn rejects_invalid_tile_names(#[case] name: &str) {
        assert!(name.parse::<DemTileId>().is_err());
    }

    #[test]
    fn tile_id_display_is_padded() {
        assert_eq!(DemTileId::new(6, 46).to_string(), "N46E006");
        assert_eq!(DemTileId::new(-77, -2).to_string(), "S02W077");
    }

    #[test]
    fn decodes_big_endian_heights() {
        let bytes = hgt_bytes(&[732, -5, 1000, HGT_NODATA]);
        let grid = decode_hgt(DemTileId::new(6, 46), &bytes).unwrap();
        assert_eq!(grid.width(), 2);
        assert_eq!(grid.height(), 2);
        assert_eq!(grid.data(), &[732., -5., 1000., -32768.]);
        assert!(grid.is_nodata(grid.get_pixel(1, 1)));
    }

    #[test]
    fn georeference_follows_tile_corner() {
        let bytes = hgt_bytes(&[0; 9]);
        let grid = decode_hgt(DemTileId::new(6, 46), &bytes).unwrap();
        let georeference = grid.georeference.unwrap();
        assert_eq!(grid.spacing, PixelSpacing::new(0.5, 0.5));
        assert_eq_approx(georeference.origin_x, 5.75, 1e-12);
        assert_eq_approx(georeference.origin_y, 47.25, 1e-12);
        assert_eq!(
            georeference.geo_key_directory.as_deref(),
            Some(&WGS84_GEO_KEYS[..])
        );
    }

    #[test]
    fn non_square_tile_is_rejected() {
        let bytes = hgt_bytes(&[0; 6]);
        assert!(matches!(
            decode_hgt(DemTileId::new(0, 0), &bytes),
            Err(ColshadeError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn reads_hgt_file_named_after_tile() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("N46E006.hgt");
        std::fs::write(&path, hgt_bytes(&[1, 2, 3, 4])).unwrap();

        let grid = read_hgt_file(&path).unwrap();
        assert_eq!(grid.data(), &[1., 2., 3., 4.]);
        assert_eq_approx(grid.georeference.unwrap().origin_x, 5.5, 1e-12);
    }
}
