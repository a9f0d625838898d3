use crate::errors::{ColshadeError, Result};
use crate::grid::{Grid, Sample};
use image::{ImageBuffer, Rgb};

/// Co-registered bands of equal size, e.g. red, green and blue. Band order
/// is kept as given.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiBandGrid<T: Sample> {
    bands: Vec<Grid<T>>,
}

impl<T: Sample> MultiBandGrid<T> {
    pub fn new(bands: Vec<Grid<T>>) -> Result<MultiBandGrid<T>> {
        let first = bands.first().ok_or(ColshadeError::EmptyInput)?;

        if let Some(other) = bands.iter().find(|band| !band.same_size(first)) {
            return Err(ColshadeError::DimensionMismatch {
                expected_width: first.width(),
                expected_height: first.height(),
                actual_width: other.width(),
                actual_height: other.height(),
            });
        }

        Ok(MultiBandGrid { bands })
    }

    pub fn bands(&self) -> &[Grid<T>] {
        &self.bands
    }

    pub fn band(&self, index: usize) -> &Grid<T> {
        &self.bands[index]
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    pub fn width(&self) -> usize {
        self.bands[0].width()
    }

    pub fn height(&self) -> usize {
        self.bands[0].height()
    }

    /// Samples of every band at a pixel, in band order.
    pub fn pixel(&self, x: usize, y: usize) -> Vec<T> {
        self.bands.iter().map(|band| band.get_pixel(x, y)).collect()
    }

    /// Interleaves the bands pixel by pixel (`r0 g0 b0 r1 g1 b1 ...`).
    pub fn interleaved(&self) -> Vec<T> {
        let pixels = self.width() * self.height();
        let mut out = Vec::with_capacity(pixels * self.bands.len());
        for i in 0..pixels {
            out.extend(self.bands.iter().map(|band| band.data()[i]));
        }
        out
    }
}

impl MultiBandGrid<u16> {
    /// Writes the first three bands to a 16-bit RGB PNG file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The path to the output PNG file.
    pub fn write_to_png(&self, file_path: &str) -> Result<()> {
        if self.band_count() < 3 {
            return Err(ColshadeError::InvalidGeometry(format!(
                "an RGB preview needs 3 bands, got {}",
                self.band_count()
            )));
        }

        let mut img: ImageBuffer<Rgb<u16>, Vec<u16>> =
            ImageBuffer::new(self.width() as u32, self.height() as u32);
        for y in 0..self.height() {
            for x in 0..self.width() {
                let rgb = [
                    self.bands[0].get_pixel(x, y),
                    self.bands[1].get_pixel(x, y),
                    self.bands[2].get_pixel(x, y),
                ];
                img.put_pixel(x as u32, y as u32, Rgb(rgb));
            }
        }
        img.save(file_path)?;
        Ok(())
    }
}
