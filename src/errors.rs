use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the relief pipeline.
///
/// The first four variants come from the numeric core and are always raised
/// before any pixel is computed. The rest belong to tile I/O, mosaicking and
/// palette handling.
#[derive(Error, Debug)]
pub enum ColshadeError {
    #[error("invalid grid geometry: {0}")]
    InvalidGeometry(String),

    #[error("invalid parameter {name} = {value} ({reason})")]
    InvalidParameters {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error(
        "grid dimensions do not match: expected {expected_width}x{expected_height}, got {actual_width}x{actual_height}"
    )]
    DimensionMismatch {
        expected_width: usize,
        expected_height: usize,
        actual_width: usize,
        actual_height: usize,
    },

    #[error("no color bands given")]
    EmptyInput,

    #[error("no *.{extension} files found in {}", .dir.display())]
    NoInputFiles { dir: PathBuf, extension: String },

    #[error("unsupported raster format in {}: {reason}", .path.display())]
    UnsupportedFormat { path: PathBuf, reason: String },

    #[error("tiles have different pixel spacing: {first:?} vs {other:?}")]
    ResolutionMismatch { first: (f64, f64), other: (f64, f64) },

    #[error("palette error on line {line}: {reason}")]
    Palette { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TIFF error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

impl ColshadeError {
    pub fn invalid_parameter(
        name: &'static str,
        value: f64,
        reason: &'static str,
    ) -> ColshadeError {
        ColshadeError::InvalidParameters {
            name,
            value,
            reason,
        }
    }
}

pub type Result<T> = std::result::Result<T, ColshadeError>;
