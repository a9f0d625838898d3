use crate::errors::{ColshadeError, Result};
use image::{ImageBuffer, Luma};
use std::fmt::Debug;

/// A numeric sample type that can be stored in a [`Grid`].
pub trait Sample: Copy + Default + Debug + PartialEq + Send + Sync + 'static {
    fn to_f64(self) -> f64;

    /// Converts a computed value into this sample type. Integer types round
    /// to nearest and saturate at their bounds.
    fn from_f64(value: f64) -> Self;
}

impl Sample for u8 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round() as u8
    }
}

impl Sample for u16 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value.round() as u16
    }
}

impl Sample for f32 {
    fn to_f64(self) -> f64 {
        self as f64
    }

    fn from_f64(value: f64) -> Self {
        value as f32
    }
}

impl Sample for f64 {
    fn to_f64(self) -> f64 {
        self
    }

    fn from_f64(value: f64) -> Self {
        value
    }
}

/// Ground distance between neighbouring pixel centers along each axis, in
/// horizontal map units. Both components are strictly positive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSpacing {
    pub x: f64,
    pub y: f64,
}

impl PixelSpacing {
    pub fn new(x: f64, y: f64) -> PixelSpacing {
        PixelSpacing { x, y }
    }

    pub fn unit() -> PixelSpacing {
        PixelSpacing { x: 1.0, y: 1.0 }
    }

    fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.x > 0. && self.y > 0.
    }
}

/// Where the grid sits on the map. Carried through every processing step
/// unchanged so writers can copy it onto their output.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct GeoReference {
    /// Map X of the upper-left corner of the upper-left pixel.
    pub origin_x: f64,
    /// Map Y of the upper-left corner of the upper-left pixel.
    pub origin_y: f64,
    pub geo_key_directory: Option<Vec<u16>>,
    pub geo_double_params: Option<Vec<f64>>,
    pub geo_ascii_params: Option<String>,
}

impl GeoReference {
    pub fn at(origin_x: f64, origin_y: f64) -> GeoReference {
        GeoReference {
            origin_x,
            origin_y,
            ..Default::default()
        }
    }
}

/// A single raster band stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid<T: Sample> {
    width: usize,
    height: usize,
    pub spacing: PixelSpacing,
    pub georeference: Option<GeoReference>,
    pub nodata: Option<f64>,
    data: Box<[T]>,
}

impl<T: Sample> Grid<T> {
    /// Creates a zero-filled grid.
    pub fn new(
        width: usize,
        height: usize,
        spacing: PixelSpacing,
    ) -> Result<Grid<T>> {
        Grid::filled(width, height, spacing, T::default())
    }

    /// Creates a grid with every sample set to `value`.
    pub fn filled(
        width: usize,
        height: usize,
        spacing: PixelSpacing,
        value: T,
    ) -> Result<Grid<T>> {
        check_geometry(width, height, &spacing)?;

        Ok(Grid {
            width,
            height,
            spacing,
            georeference: None,
            nodata: None,
            data: vec![value; width * height].into_boxed_slice(),
        })
    }

    /// Wraps existing row-major samples.
    pub fn from_vec(
        width: usize,
        height: usize,
        spacing: PixelSpacing,
        data: Vec<T>,
    ) -> Result<Grid<T>> {
        check_geometry(width, height, &spacing)?;

        if data.len() != width * height {
            return Err(ColshadeError::InvalidGeometry(format!(
                "{} samples do not fill a {}x{} grid",
                data.len(),
                width,
                height
            )));
        }

        Ok(Grid {
            width,
            height,
            spacing,
            georeference: None,
            nodata: None,
            data: data.into_boxed_slice(),
        })
    }

    /// Wraps samples produced for a grid with the same geometry and
    /// georeference as `self`. The caller guarantees the sample count.
    pub(crate) fn derive<U: Sample>(&self, data: Vec<U>) -> Grid<U> {
        debug_assert_eq!(data.len(), self.width * self.height);

        Grid {
            width: self.width,
            height: self.height,
            spacing: self.spacing,
            georeference: self.georeference.clone(),
            nodata: None,
            data: data.into_boxed_slice(),
        }
    }

    pub fn with_georeference(mut self, georeference: GeoReference) -> Self {
        self.georeference = Some(georeference);
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn data(&self) -> &[T] {
        &self.data
    }

    /// Iterates over the grid rows, top to bottom.
    pub fn rows(&self) -> std::slice::Chunks<'_, T> {
        self.data.chunks(self.width)
    }

    /// Whether `other` has the same width and height.
    pub fn same_size<U: Sample>(&self, other: &Grid<U>) -> bool {
        self.width == other.width && self.height == other.height
    }

    /// Whether the sample equals the grid's no-data sentinel.
    pub fn is_nodata(&self, value: T) -> bool {
        match self.nodata {
            Some(nodata) => value.to_f64() == nodata,
            None => false,
        }
    }

    /// Gets the value of the pixel at the given coordinates.
    pub fn get_pixel(&self, x: usize, y: usize) -> T {
        if x >= self.width || y >= self.height {
            panic!("Pixel coordinates out of bounds");
        }

        self.data[y * self.width + x]
    }

    /// Sets the pixel at the given coordinates to the given value.
    pub fn set_pixel(&mut self, x: usize, y: usize, value: T) {
        if x >= self.width || y >= self.height {
            panic!("Pixel coordinates out of bounds");
        }

        self.data[y * self.width + x] = value;
    }
}

impl Grid<u16> {
    /// Writes the grid to a 16-bit grayscale PNG file.
    ///
    /// # Arguments
    ///
    /// * `file_path` - The path to the output PNG file.
    pub fn write_to_png(&self, file_path: &str) -> Result<()> {
        let mut img: ImageBuffer<Luma<u16>, Vec<u16>> =
            ImageBuffer::new(self.width as u32, self.height as u32);
        for (y, row) in self.rows().enumerate() {
            for (x, value) in row.iter().enumerate() {
                img.put_pixel(x as u32, y as u32, Luma([*value]));
            }
        }
        img.save(file_path)?;
        Ok(())
    }
}

fn check_geometry(
    width: usize,
    height: usize,
    spacing: &PixelSpacing,
) -> Result<()> {
    if width == 0 || height == 0 {
        return Err(ColshadeError::InvalidGeometry(format!(
            "grid size {}x{} is empty",
            width, height
        )));
    }

    if !spacing.is_valid() {
        return Err(ColshadeError::InvalidGeometry(format!(
            "pixel spacing {:?} must be positive",
            spacing
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_large_grid() {
        let grid: Grid<u16> =
            Grid::new(1000, 1000, PixelSpacing::unit()).unwrap();
        assert_eq!(grid.width(), 1000);
        assert_eq!(grid.height(), 1000);
        assert_eq!(grid.data().len(), 1000 * 1000);
    }

    /// A new grid is created with the correct dimensions and properties.
    #[test]
    fn create_grid() {
        let grid: Grid<f32> =
            Grid::new(10, 15, PixelSpacing::new(30., 20.)).unwrap();
        assert_eq!(grid.width(), 10);
        assert_eq!(grid.height(), 15);
        assert_eq!(grid.spacing, PixelSpacing::new(30., 20.));
        assert_eq!(grid.data().len(), 150);
        assert_eq!(grid.nodata, None);
        assert_eq!(grid.georeference, None);
    }

    /// The samples are zero by default when the grid is created.
    #[test]
    fn samples_are_zero_by_default() {
        let grid: Grid<u16> =
            Grid::new(10, 15, PixelSpacing::unit()).unwrap();
        assert_eq!(grid.get_pixel(0, 0), 0);
        assert_eq!(grid.get_pixel(4, 5), 0);
    }

    /// Pixels can be set and then retrieved.
    #[test]
    fn set_and_get_pixel() {
        let mut grid: Grid<u16> =
            Grid::new(10, 15, PixelSpacing::unit()).unwrap();
        grid.set_pixel(3, 4, 123);
        assert_eq!(grid.get_pixel(3, 4), 123);
        grid.set_pixel(3, 4, 1000);
        assert_eq!(grid.get_pixel(3, 4), 1000);
        assert_eq!(grid.data()[4 * 10 + 3], 1000);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn get_pixel_outside_grid_panics() {
        let grid: Grid<u8> = Grid::new(2, 2, PixelSpacing::unit()).unwrap();
        grid.get_pixel(2, 0);
    }

    #[test]
    fn zero_sized_grid_is_rejected() {
        let result: Result<Grid<f32>> =
            Grid::new(0, 5, PixelSpacing::unit());
        assert!(matches!(result, Err(ColshadeError::InvalidGeometry(_))));

        let result: Result<Grid<f32>> =
            Grid::new(5, 0, PixelSpacing::unit());
        assert!(matches!(result, Err(ColshadeError::InvalidGeometry(_))));
    }

    #[test]
    fn non_positive_spacing_is_rejected() {
        for spacing in [
            PixelSpacing::new(0., 1.),
            PixelSpacing::new(1., -1.),
            PixelSpacing::new(f64::NAN, 1.),
        ] {
            let result: Result<Grid<f32>> = Grid::new(2, 2, spacing);
            assert!(matches!(
                result,
                Err(ColshadeError::InvalidGeometry(_))
            ));
        }
    }

    #[test]
    fn from_vec_requires_matching_sample_count() {
        let result =
            Grid::from_vec(3, 2, PixelSpacing::unit(), vec![0f32; 5]);
        assert!(matches!(result, Err(ColshadeError::InvalidGeometry(_))));

        let grid =
            Grid::from_vec(3, 2, PixelSpacing::unit(), vec![1f32; 6]).unwrap();
        assert_eq!(grid.rows().count(), 2);
        assert!(grid.rows().all(|row| row.len() == 3));
    }

    #[test]
    fn derived_grid_keeps_geometry_and_georeference() {
        let grid = Grid::from_vec(
            2,
            2,
            PixelSpacing::new(0.5, 0.25),
            vec![1f32, 2., 3., 4.],
        )
        .unwrap()
        .with_georeference(GeoReference::at(6.0, 47.0))
        .with_nodata(-9999.);

        let derived: Grid<u16> = grid.derive(vec![9, 8, 7, 6]);
        assert!(derived.same_size(&grid));
        assert_eq!(derived.spacing, grid.spacing);
        assert_eq!(derived.georeference, grid.georeference);
        assert_eq!(derived.nodata, None);
        assert_eq!(derived.get_pixel(1, 1), 6);
    }

    #[test]
    fn nodata_is_recognized() {
        let grid = Grid::from_vec(2, 1, PixelSpacing::unit(), vec![0f32, 5.])
            .unwrap()
            .with_nodata(-32768.);
        assert!(grid.is_nodata(-32768.));
        assert!(!grid.is_nodata(0.));
    }

    #[test]
    fn integer_samples_round_and_saturate() {
        assert_eq!(u8::from_f64(127.5), 128);
        assert_eq!(u8::from_f64(300.), 255);
        assert_eq!(u16::from_f64(-4.), 0);
        assert_eq!(u16::from_f64(217.66), 218);
    }

    /// The grid can be written to a PNG file.
    #[test]
    fn write_to_png() {
        let width = 100;
        let height = 150;
        let mut grid: Grid<u16> =
            Grid::new(width, height, PixelSpacing::unit()).unwrap();
        for y in 0..height {
            for x in 0..width {
                grid.set_pixel(x, y, ((x + y) * 5) as u16);
            }
        }
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("test-grid16.png");
        grid.write_to_png(&path.to_string_lossy()).unwrap();
        assert!(path.exists());
    }
}
