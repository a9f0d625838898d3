//! Mapping elevations to colors through a breakpoint palette.
//!
//! Palette files hold one breakpoint per line:
//!
//! ```text
//! # elevation  red green blue [alpha]
//! nv    0   0   0
//! 0%    46  154 88
//! 1000  251 255 128
//! 100%  255 255 255
//! ```
//!
//! Fields may be separated by whitespace, commas or colons. Keys are an
//! elevation, a percentage of the grid's elevation range, or `nv` for the
//! no-data color. Alpha values are accepted and ignored.

use crate::errors::{ColshadeError, Result};
use crate::grid::Grid;
use crate::multiband::MultiBandGrid;
use rayon::prelude::*;
use std::path::Path;
use tracing::debug;

pub type Rgb = [u8; 3];

#[derive(Debug, Clone, Copy, PartialEq)]
enum BreakpointKey {
    Elevation(f64),
    Percent(f64),
}

/// Breakpoints as read from a palette file, before they are resolved
/// against a concrete grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Palette {
    breakpoints: Vec<(BreakpointKey, Rgb)>,
    nodata_color: Rgb,
}

impl Palette {
    pub fn parse(text: &str) -> Result<Palette> {
        let mut breakpoints = Vec::new();
        let mut nodata_color = [0, 0, 0];

        for (index, line) in text.lines().enumerate() {
            let line_number = index + 1;
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line
                .split(|c: char| c.is_whitespace() || c == ',' || c == ':')
                .filter(|field| !field.is_empty())
                .collect();

            if fields.len() != 4 && fields.len() != 5 {
                return Err(palette_error(
                    line_number,
                    format!("expected a key and 3 or 4 color values, got {}", line),
                ));
            }

            let mut color = [0u8; 3];
            for (channel, field) in color.iter_mut().zip(&fields[1..4]) {
                *channel = field.parse::<u8>().map_err(|_| {
                    palette_error(
                        line_number,
                        format!("color value {} is not within 0-255", field),
                    )
                })?;
            }

            let key = fields[0];
            if key.eq_ignore_ascii_case("nv") {
                nodata_color = color;
            } else if let Some(percent) = key.strip_suffix('%') {
                let percent = parse_number(percent, line_number)?;
                breakpoints.push((BreakpointKey::Percent(percent), color));
            } else {
                let elevation = parse_number(key, line_number)?;
                breakpoints.push((BreakpointKey::Elevation(elevation), color));
            }
        }

        if breakpoints.is_empty() {
            return Err(palette_error(0, "palette has no breakpoints".to_string()));
        }

        Ok(Palette {
            breakpoints,
            nodata_color,
        })
    }

    pub fn from_file(path: &Path) -> Result<Palette> {
        let text = std::fs::read_to_string(path)?;
        Palette::parse(&text)
    }

    pub fn nodata_color(&self) -> Rgb {
        self.nodata_color
    }

    /// Resolves percentage breakpoints against the elevation range
    /// `[min, max]` and sorts the breakpoints by elevation.
    pub fn ramp(&self, min: f64, max: f64) -> ColorRamp {
        let mut stops: Vec<(f64, Rgb)> = self
            .breakpoints
            .iter()
            .map(|(key, color)| match key {
                BreakpointKey::Elevation(elevation) => (*elevation, *color),
                BreakpointKey::Percent(percent) => {
                    (min + (max - min) * percent / 100., *color)
                }
            })
            .collect();
        stops.sort_by(|a, b| a.0.total_cmp(&b.0));

        ColorRamp { stops }
    }
}

fn parse_number(field: &str, line: usize) -> Result<f64> {
    field
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| palette_error(line, format!("{} is not a number", field)))
}

fn palette_error(line: usize, reason: String) -> ColshadeError {
    ColshadeError::Palette { line, reason }
}

/// Sorted elevation breakpoints with linear interpolation between them.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorRamp {
    stops: Vec<(f64, Rgb)>,
}

impl ColorRamp {
    /// Color for an elevation. Values outside the breakpoints take the color
    /// of the nearest end; NaN takes the color of the lowest breakpoint.
    pub fn color_at(&self, value: f64) -> Rgb {
        let (first, last) = (self.stops[0], self.stops[self.stops.len() - 1]);
        if value.is_nan() || value <= first.0 {
            return first.1;
        }
        if value >= last.0 {
            return last.1;
        }

        // first stop above the value; value > first.0 so upper >= 1
        let upper = self.stops.partition_point(|(elevation, _)| *elevation <= value);
        let (low_elevation, low) = self.stops[upper - 1];
        let (high_elevation, high) = self.stops[upper];

        let t = (value - low_elevation) / (high_elevation - low_elevation);
        let mut color = [0u8; 3];
        for (i, channel) in color.iter_mut().enumerate() {
            let c = low[i] as f64 + (high[i] as f64 - low[i] as f64) * t;
            *channel = c.round() as u8;
        }
        color
    }
}

/// Colors an elevation grid into red, green and blue bands.
///
/// Percentage breakpoints refer to the range of the grid's valid samples.
/// No-data and NaN samples take the palette's `nv` color.
pub fn colorize(elevation: &Grid<f32>, palette: &Palette) -> Result<MultiBandGrid<u8>> {
    let is_valid = |value: &f32| !value.is_nan() && !elevation.is_nodata(*value);

    let (min, max) = elevation
        .data()
        .iter()
        .filter(|value| is_valid(*value))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(min, max), value| {
            (min.min(*value as f64), max.max(*value as f64))
        });
    let (min, max) = if min > max { (0., 0.) } else { (min, max) };

    debug!(min, max, "colorizing elevation range");

    let ramp = palette.ramp(min, max);
    let colors: Vec<Rgb> = elevation
        .data()
        .par_iter()
        .map(|value| {
            if is_valid(value) {
                ramp.color_at(*value as f64)
            } else {
                palette.nodata_color
            }
        })
        .collect();

    let bands: Vec<Grid<u8>> = (0..3)
        .map(|channel| elevation.derive(colors.iter().map(|c| c[channel]).collect()))
        .collect();

    MultiBandGrid::new(bands)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PixelSpacing;
    use rstest::rstest;

    const PALETTE: &str = "\
# test palette
nv 1 2 3
0 0 0 0
100,200,100,0
200:255:255:255:255
";

    #[test]
    fn parses_breakpoints_and_nodata_color() {
        let palette = Palette::parse(PALETTE).unwrap();
        assert_eq!(palette.breakpoints.len(), 3);
        assert_eq!(palette.nodata_color(), [1, 2, 3]);
    }

    #[rstest]
    #[case(-50., [0, 0, 0])]
    #[case(0., [0, 0, 0])]
    #[case(50., [100, 50, 0])]
    #[case(100., [200, 100, 0])]
    #[case(150., [228, 178, 128])]
    #[case(200., [255, 255, 255])]
    #[case(9000., [255, 255, 255])]
    fn interpolates_between_breakpoints(#[case] elevation: f64, #[case] expected: Rgb) {
        let ramp = Palette::parse(PALETTE).unwrap().ramp(0., 0.);
        assert_eq!(ramp.color_at(elevation), expected);
    }

    #[test]
    fn nan_takes_the_lowest_color() {
        let ramp = Palette::parse(PALETTE).unwrap().ramp(0., 0.);
        assert_eq!(ramp.color_at(f64::NAN), [0, 0, 0]);
    }

    #[test]
    fn breakpoints_are_sorted() {
        let palette = Palette::parse("100 255 255 255\n0 0 0 0").unwrap();
        assert_eq!(palette.ramp(0., 0.).color_at(50.), [128, 128, 128]);
    }

    #[test]
    fn percentages_follow_the_elevation_range() {
        let palette = Palette::parse("0% 0 0 0\n100% 200 200 200").unwrap();
        let ramp = palette.ramp(1000., 2000.);
        assert_eq!(ramp.color_at(1000.), [0, 0, 0]);
        assert_eq!(ramp.color_at(1500.), [100, 100, 100]);
        assert_eq!(ramp.color_at(2000.), [200, 200, 200]);
    }

    #[rstest]
    #[case("")]
    #[case("# only a comment\nnv 0 0 0")]
    #[case("100 1 2")]
    #[case("100 1 2 300")]
    #[case("high 1 2 3")]
    fn rejects_invalid_palettes(#[case] text: &str) {
        assert!(matches!(
            Palette::parse(text),
            Err(ColshadeError::Palette { .. })
        ));
    }

    #[test]
    fn colorize_makes_three_aligned_bands() {
        let dem = Grid::from_vec(
            3,
            1,
            PixelSpacing::unit(),
            vec![0., 100., -32768.],
        )
        .unwrap()
        .with_nodata(-32768.);
        let relief = colorize(&dem, &Palette::parse(PALETTE).unwrap()).unwrap();

        assert_eq!(relief.band_count(), 3);
        assert_eq!(relief.width(), 3);
        assert_eq!(relief.pixel(0, 0), vec![0, 0, 0]);
        assert_eq!(relief.pixel(1, 0), vec![200, 100, 0]);
        assert_eq!(relief.pixel(2, 0), vec![1, 2, 3]);
    }

    #[test]
    fn colorize_resolves_percentages_over_valid_samples() {
        let dem = Grid::from_vec(
            2,
            2,
            PixelSpacing::unit(),
            vec![10., 20., f32::NAN, -1.],
        )
        .unwrap()
        .with_nodata(-1.);
        let palette = Palette::parse("0% 0 0 0\n100% 100 100 100").unwrap();
        let relief = colorize(&dem, &palette).unwrap();
        assert_eq!(relief.band(0).data(), &[0, 100, 0, 0]);
    }
}
