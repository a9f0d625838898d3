//! Shaded-relief illumination of elevation grids.

pub mod gradient;
pub mod illumination;
pub mod parameters;

pub use illumination::{compute_illumination, LightSource, FULL_BRIGHTNESS};
pub use parameters::IlluminationParameters;
