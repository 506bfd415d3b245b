//! forestwatch CLI - Vegetation loss estimation from Sentinel-2 imagery

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use forestwatch_algorithms::imagery::{
    change_map, estimate_loss, vegetation_mask, ChangeMetrics, ChangeParams, MaskParams,
    DEFAULT_THRESHOLD, LEGACY_TOTAL_PIXELS,
};
use forestwatch_cloud::blocking::ImageFetcherBlocking;
use forestwatch_cloud::config::{
    ConfigStore, ShConfig, CDSE_BASE_URL, CDSE_TOKEN_URL, DEFAULT_PROFILE,
};
use forestwatch_cloud::{Evalscript, FetchParams, TimeInterval};
use forestwatch_core::io::{read_image, write_image};
use forestwatch_core::{BBox, Raster};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "forestwatch")]
#[command(author, version, about = "Vegetation loss estimation from Sentinel-2 imagery", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Credential profile file (default: <config dir>/forestwatch/config.toml)
    #[arg(long, global = true, env = "FORESTWATCH_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Save Sentinel Hub credentials under a profile name
    Configure {
        /// Profile name
        #[arg(short, long, default_value = DEFAULT_PROFILE)]
        profile: String,
        /// OAuth client id
        #[arg(long, env = "SH_CLIENT_ID")]
        client_id: String,
        /// OAuth client secret
        #[arg(long, env = "SH_CLIENT_SECRET", hide_env_values = true)]
        client_secret: String,
        /// OAuth token endpoint
        #[arg(long, default_value = CDSE_TOKEN_URL)]
        token_url: String,
        /// Sentinel Hub service URL
        #[arg(long, default_value = CDSE_BASE_URL)]
        base_url: String,
    },
    /// Fetch before/after imagery and estimate vegetation loss
    Run {
        /// Profile name
        #[arg(short, long, default_value = DEFAULT_PROFILE)]
        profile: String,
        /// Area of interest as max_lon,min_lat,min_lon,max_lat (prompted if omitted)
        #[arg(long, allow_hyphen_values = true, value_parser = parse_bbox)]
        bbox: Option<BBox>,
        /// Date range of the earlier mosaic
        #[arg(long, default_value = "2017-01-01/2017-06-30", value_parser = parse_interval)]
        before: TimeInterval,
        /// Date range of the later mosaic
        #[arg(long, default_value = "2024-02-01/2024-07-17", value_parser = parse_interval)]
        after: TimeInterval,
        /// Ground resolution in meters per pixel
        #[arg(short, long, default_value = "25")]
        resolution: f64,
        /// Brightness factor for true color images
        #[arg(long, default_value = "6")]
        true_color_brightness: f64,
        /// Brightness factor for NDVI images
        #[arg(long, default_value = "0.8")]
        ndvi_brightness: f64,
        /// Directory for the fetched images
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
        /// Only fetch the NDVI images
        #[arg(long)]
        skip_true_color: bool,
        #[command(flatten)]
        loss: LossArgs,
    },
    /// Estimate vegetation loss from two saved NDVI images
    Estimate {
        /// Earlier NDVI image
        before: PathBuf,
        /// Later NDVI image
        after: PathBuf,
        /// Ground resolution in meters per pixel
        #[arg(short, long, default_value = "25")]
        resolution: f64,
        #[command(flatten)]
        loss: LossArgs,
    },
    /// Show information about an image file
    Info {
        /// Input image file
        input: PathBuf,
    },
}

#[derive(Args)]
struct LossArgs {
    /// Green intensity (0-255) below which a pixel counts as vegetation
    #[arg(short, long, default_value_t = DEFAULT_THRESHOLD)]
    threshold: u8,
    /// Denominator of the percentage (default: rows x cols of the images)
    #[arg(long, conflicts_with = "legacy_total")]
    total_pixels: Option<usize>,
    /// Use the 2183 x 1557 pixel total of the Rondonia reference scene
    #[arg(long)]
    legacy_total: bool,
    /// Also write a change map (1 = loss, 2 = unchanged, 3 = gain)
    #[arg(long)]
    change_map: Option<PathBuf>,
}

impl LossArgs {
    fn params(&self, resolution_m: f64) -> ChangeParams {
        let total_pixel_count = if self.legacy_total {
            Some(LEGACY_TOTAL_PIXELS)
        } else {
            self.total_pixels
        };
        ChangeParams {
            threshold: self.threshold,
            total_pixel_count,
            ..ChangeParams::for_resolution(resolution_m)
        }
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn open_store(path: Option<PathBuf>) -> Result<ConfigStore> {
    match path {
        Some(path) => Ok(ConfigStore::new(path)),
        None => ConfigStore::open_default().context("Failed to locate config file"),
    }
}

/// `max_lon,min_lat,min_lon,max_lat`, the order of the interactive prompts.
fn parse_bbox(s: &str) -> std::result::Result<BBox, String> {
    let values = s
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in '{s}': {e}"))?;
    let [max_lon, min_lat, min_lon, max_lat] = values[..] else {
        return Err(format!("expected 4 comma-separated values, got {}", values.len()));
    };
    BBox::from_aoi(max_lon, min_lat, min_lon, max_lat).map_err(|e| e.to_string())
}

fn parse_interval(s: &str) -> std::result::Result<TimeInterval, String> {
    s.parse::<TimeInterval>().map_err(|e| e.to_string())
}

fn prompt_f64<R: BufRead, W: Write>(input: &mut R, output: &mut W, label: &str) -> Result<f64> {
    write!(output, "{label}: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        bail!("No input for {label}");
    }
    line.trim()
        .parse::<f64>()
        .with_context(|| format!("Invalid {label}: '{}'", line.trim()))
}

fn prompt_bbox<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> Result<BBox> {
    writeln!(output, "Enter the coordinates for the bounding box (AOI):")?;
    writeln!(output, "For the Rondonia forest : (-63.97, -10.72, -64.47, -10.37)")?;

    let max_lon = prompt_f64(input, output, "Maximum Longitude")?;
    let min_lat = prompt_f64(input, output, "Minimum Latitude")?;
    let min_lon = prompt_f64(input, output, "Minimum Longitude")?;
    let max_lat = prompt_f64(input, output, "Maximum Latitude")?;

    BBox::from_aoi(max_lon, min_lat, min_lon, max_lat).context("Invalid bounding box")
}

fn read_raster(path: &Path) -> Result<Raster> {
    let pb = spinner("Reading image...");
    let raster = read_image(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    pb.finish_and_clear();
    info!("Input: {} x {} x {}", raster.cols(), raster.rows(), raster.bands());
    Ok(raster)
}

fn fetch(fetcher: &ImageFetcherBlocking, label: &str, params: FetchParams) -> Result<Raster> {
    let pb = spinner(&format!("Fetching {label}..."));
    let start = Instant::now();
    let raster = fetcher
        .fetch(&params)
        .with_context(|| format!("Failed to fetch {label}"))?;
    pb.finish_and_clear();
    if let Some(path) = &params.output_path {
        info!("{} saved to: {} ({:.2?})", label, path.display(), start.elapsed());
    }
    Ok(raster)
}

fn compute_loss(before: &Raster, after: &Raster, loss: &LossArgs, resolution_m: f64) -> Result<ChangeMetrics> {
    let params = loss.params(resolution_m);
    let metrics = estimate_loss(before, after, &params)
        .context("Failed to estimate vegetation loss")?;

    if let Some(path) = &loss.change_map {
        let mask_params = MaskParams {
            channel: params.channel,
            threshold: params.threshold,
        };
        let before_mask = vegetation_mask(before, &mask_params)?;
        let after_mask = vegetation_mask(after, &mask_params)?;
        let map = change_map(&before_mask, &after_mask, before)?;
        write_image(&map, path).context("Failed to write change map")?;
        info!("Change map saved to: {}", path.display());
    }

    Ok(metrics)
}

fn report(metrics: &ChangeMetrics) -> String {
    format!(
        "Number of pixels with vegetation loss: {}\n\
         Area of vegetation loss in square meters: {}\n\
         Area of vegetation loss in hectares: {}\n\
         Percentage of vegetation loss: {:.2}%",
        metrics.pixel_delta,
        metrics.area_m2,
        float_with_point(metrics.area_ha),
        metrics.pct
    )
}

/// Shortest decimal form that always shows a fractional part (`625.0`).
fn float_with_point(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 {
        format!("{v:.1}")
    } else {
        format!("{v}")
    }
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose)?;

    match cli.command {
        // ── Configure ────────────────────────────────────────────────
        Commands::Configure {
            profile,
            client_id,
            client_secret,
            token_url,
            base_url,
        } => {
            let store = open_store(cli.config)?;
            let config = ShConfig {
                sh_client_id: client_id,
                sh_client_secret: client_secret,
                sh_token_url: token_url,
                sh_base_url: base_url,
                ..ShConfig::default()
            };
            store
                .save_profile(&profile, &config)
                .context("Failed to save profile")?;

            let saved = store.load_profile(&profile)?;
            println!("Profile '{}' saved to: {}", profile, store.path().display());
            println!("  Service: {}", saved.sh_base_url);
        }

        // ── Run ──────────────────────────────────────────────────────
        Commands::Run {
            profile,
            bbox,
            before,
            after,
            resolution,
            true_color_brightness,
            ndvi_brightness,
            output_dir,
            skip_true_color,
            loss,
        } => {
            let store = open_store(cli.config)?;
            let config = store
                .load_profile(&profile)
                .with_context(|| format!("Failed to load profile '{profile}'"))?;

            let bbox = match bbox {
                Some(bbox) => bbox,
                None => prompt_bbox(&mut io::stdin().lock(), &mut io::stdout())?,
            };
            info!("Area of interest: {}", bbox);

            std::fs::create_dir_all(&output_dir)
                .with_context(|| format!("Failed to create {}", output_dir.display()))?;
            let fetcher = ImageFetcherBlocking::new(config).context("Failed to set up client")?;
            let start = Instant::now();

            let request = |script: Evalscript, interval: TimeInterval, brightness: f64, name: &str| {
                FetchParams::new(script, bbox, interval)
                    .resolution(resolution)
                    .brightness(brightness)
                    .save_to(output_dir.join(name))
            };

            if !skip_true_color {
                fetch(
                    &fetcher,
                    "true color (before)",
                    request(Evalscript::TrueColor, before, true_color_brightness, "true_color_before.png"),
                )?;
                fetch(
                    &fetcher,
                    "true color (after)",
                    request(Evalscript::TrueColor, after, true_color_brightness, "true_color_after.png"),
                )?;
            }

            let ndvi_before = fetch(
                &fetcher,
                "NDVI (before)",
                request(Evalscript::NdviColor, before, ndvi_brightness, "ndvi_before.png"),
            )?;
            let ndvi_after = fetch(
                &fetcher,
                "NDVI (after)",
                request(Evalscript::NdviColor, after, ndvi_brightness, "ndvi_after.png"),
            )?;

            let metrics = compute_loss(&ndvi_before, &ndvi_after, &loss, resolution)?;
            info!("Processing time: {:.2?}", start.elapsed());
            println!("{}", report(&metrics));
        }

        // ── Estimate ─────────────────────────────────────────────────
        Commands::Estimate {
            before,
            after,
            resolution,
            loss,
        } => {
            let before = read_raster(&before)?;
            let after = read_raster(&after)?;
            let metrics = compute_loss(&before, &after, &loss, resolution)?;
            println!("{}", report(&metrics));
        }

        // ── Info ─────────────────────────────────────────────────────
        Commands::Info { input } => {
            let raster = read_raster(&input)?;
            let (rows, cols) = raster.shape();
            let bounds = raster.bounds();

            println!("File: {}", input.display());
            println!(
                "Dimensions: {} x {} ({} pixels, {} bands)",
                cols,
                rows,
                raster.pixel_count(),
                raster.bands()
            );
            println!("Cell size: {}", raster.transform().cell_size());
            println!(
                "Bounds: ({:.6}, {:.6}) - ({:.6}, {:.6})",
                bounds.0, bounds.1, bounds.2, bounds.3
            );
            if let Some(crs) = raster.crs() {
                println!("CRS: {}", crs);
            }
            println!("\nStatistics:");
            for stats in raster.statistics() {
                match (stats.min, stats.max, stats.mean) {
                    (Some(min), Some(max), Some(mean)) => println!(
                        "  Band {}: min {}, max {}, mean {:.4}",
                        stats.band, min, max, mean
                    ),
                    _ => println!("  Band {}: empty", stats.band),
                }
            }
        }
    }

    Ok(())
}
