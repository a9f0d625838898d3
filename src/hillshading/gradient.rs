use crate::grid::Grid;

/// Elevation change along one grid axis at `index`, in elevation units per
/// pixel. Centered difference inside the grid, one-sided difference on the
/// first and last sample. An axis with a single sample has no gradient.
fn axis_difference(index: usize, len: usize, at: impl Fn(usize) -> f64) -> f64 {
    if len < 2 {
        0.
    } else if index == 0 {
        at(1) - at(0)
    } else if index == len - 1 {
        at(index) - at(index - 1)
    } else {
        (at(index + 1) - at(index - 1)) / 2.
    }
}

/// Calculates the scaled elevation gradient at the given pixel.
///
/// Returns `(dz_drow, dz_dcol)`: the derivative along the row axis (north to
/// south) and along the column axis (west to east). Both are z-factor scaled
/// elevation change divided by the pixel spacing of their axis.
pub fn gradient_at(dem: &Grid<f32>, x: usize, y: usize, z_factor: f64) -> (f64, f64) {
    let dz_drow = axis_difference(y, dem.height(), |row| {
        dem.get_pixel(x, row) as f64
    });
    let dz_dcol = axis_difference(x, dem.width(), |col| {
        dem.get_pixel(col, y) as f64
    });

    (
        z_factor * dz_drow / dem.spacing.y,
        z_factor * dz_dcol / dem.spacing.x,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PixelSpacing;
    use crate::testing::assert_eq_approx;

    fn dem(width: usize, height: usize, heights: Vec<f32>) -> Grid<f32> {
        Grid::from_vec(width, height, PixelSpacing::unit(), heights).unwrap()
    }

    #[test]
    fn flat_dem_has_no_gradient() {
        let dem = dem(3, 3, vec![100.; 9]);
        for y in 0..3 {
            for x in 0..3 {
                assert_eq!(gradient_at(&dem, x, y, 1.), (0., 0.));
            }
        }
    }

    #[test]
    fn uses_centered_difference_inside_and_one_sided_at_edges() {
        // heights grow quadratically along the columns: 0 1 4 9
        let dem = dem(4, 1, vec![0., 1., 4., 9.]);
        let d_col: Vec<f64> = (0..4).map(|x| gradient_at(&dem, x, 0, 1.).1).collect();
        assert_eq!(d_col, vec![1., 2., 4., 5.]);
    }

    #[test]
    fn row_axis_points_south() {
        let dem = dem(1, 3, vec![10., 20., 30.]);
        for y in 0..3 {
            assert_eq!(gradient_at(&dem, 0, y, 1.), (10., 0.));
        }
    }

    #[test]
    fn single_sample_axis_has_zero_gradient() {
        let dem = dem(1, 1, vec![42.]);
        assert_eq!(gradient_at(&dem, 0, 0, 1.), (0., 0.));
    }

    #[test]
    fn z_factor_and_spacing_scale_the_gradient() {
        let dem = Grid::from_vec(
            3,
            3,
            PixelSpacing::new(30., 10.),
            vec![0., 30., 60., 0., 30., 60., 0., 30., 60.],
        )
        .unwrap();

        let (dz_drow, dz_dcol) = gradient_at(&dem, 1, 1, 1.);
        assert_eq!(dz_drow, 0.);
        assert_eq_approx(dz_dcol, 1., 1e-12);

        let (_, dz_dcol) = gradient_at(&dem, 1, 1, 0.5);
        assert_eq_approx(dz_dcol, 0.5, 1e-12);
    }
}
