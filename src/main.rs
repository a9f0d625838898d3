use clap::Parser;
use colshade::hillshading::parameters::DEFAULT_Z_FACTOR;
use colshade::hillshading::IlluminationParameters;
use colshade::pipeline::{run, PipelineConfig};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, Level};
use tracing_subscriber::FmtSubscriber;

/// Creates a colorized, shaded relief GeoTIFF from a directory of
/// elevation tiles.
#[derive(Parser, Debug)]
#[command(name = "colshade")]
#[command(about = "Shaded color relief from elevation tiles")]
struct Args {
    /// Directory containing the elevation tiles
    #[arg(long, env = "COLSHADE_INPUT_DIR")]
    input_dir: PathBuf,

    /// Directory for intermediate and final rasters
    #[arg(long, env = "COLSHADE_WORK_DIR", default_value = ".")]
    work_dir: PathBuf,

    /// Extension of the tile files (tif, tiff or hgt)
    #[arg(long, env = "COLSHADE_EXTENSION", default_value = "tif")]
    extension: String,

    /// File name of the final relief, written into the work directory
    #[arg(long, env = "COLSHADE_OUTPUT", default_value = "relief.tif")]
    output: String,

    /// Color palette file (elevation r g b per line)
    #[arg(long, env = "COLSHADE_PALETTE")]
    palette: PathBuf,

    /// Compass bearing of the light in degrees
    #[arg(long, env = "COLSHADE_AZIMUTH", default_value_t = 315.0, allow_hyphen_values = true)]
    azimuth: f64,

    /// Light altitude above the horizon in degrees (0-90)
    #[arg(long, env = "COLSHADE_ALTITUDE", default_value_t = 45.0)]
    altitude: f64,

    /// Elevation to horizontal unit conversion factor
    #[arg(long, env = "COLSHADE_Z_FACTOR", default_value_t = DEFAULT_Z_FACTOR)]
    z_factor: f64,

    /// Also write a PNG preview of the result
    #[arg(long, env = "COLSHADE_PREVIEW_PNG")]
    preview_png: Option<PathBuf>,

    /// Log level
    #[arg(long, env = "COLSHADE_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

fn main() -> ExitCode {
    dotenv::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("failed to install logger: {}", e);
    }

    let illumination = match IlluminationParameters::new(
        args.azimuth,
        args.altitude,
        args.z_factor,
    ) {
        Ok(parameters) => parameters,
        Err(e) => {
            error!("{}", e);
            return ExitCode::FAILURE;
        }
    };

    let config = PipelineConfig {
        input_dir: args.input_dir,
        extension: args.extension,
        work_dir: args.work_dir,
        output_name: args.output,
        palette: args.palette,
        illumination,
        preview_png: args.preview_png,
    };

    match run(&config) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
