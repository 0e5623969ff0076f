//! dualmod - dual-modulation HDR display simulator
//!
//! Splits one HDR image into a projector (DLP) drive image and an LCD
//! attenuation drive image, and writes both as 8-bit files.

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser};
use dualmod_core::DenseImage;
use dualmod_io::{is_supported_format, read_image, write_image};
use dualmod_ops::{GaussianPsf, HdrDisplay, ProjectorDisplay, ProjectorParams, PsfParams};
use dualmod_transfer::{GainOffsetGamma, ResponseParams};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Options that are also accepted with a single leading dash.
const LEGACY_OPTIONS: &[&str] = &["-in", "-out", "-res", "-psf", "-dlp", "-lcd", "-help"];

const EXIT_USAGE: u8 = 1;
const EXIT_WRITE_FAILED: u8 = 1;
const EXIT_BAD_ARGS: u8 = 2;
const EXIT_LOAD_FAILED: u8 = 255;

#[derive(Parser, Debug)]
#[command(name = "dualmod")]
#[command(author, version, about = "Dual-modulation HDR display simulator")]
#[command(long_about = "
Computes the two drive images of a projector + LCD dual-modulation HDR
display: <name>_dlp.<format> and <name>_lcd.<format>, written to the
current directory.

Examples:
  dualmod -in memorial.hdr
  dualmod -in memorial.hdr -out jpg -res 1024 768
  dualmod -in memorial.hdr -psf 12 -dlp 3000 3 2.4 -lcd 1 0.001 2.2
")]
struct Cli {
    /// Input image
    #[arg(long = "in", value_name = "FILENAME")]
    input: Option<PathBuf>,

    /// Format of output images (png, jpg, jpeg)
    #[arg(long, value_name = "FORMAT", default_value = "png")]
    out: String,

    /// Resize the input on load
    #[arg(long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
    res: Option<Vec<usize>>,

    /// Gaussian PSF sigma in pixels; the kernel is floor(sigma) wide
    #[arg(long, value_name = "SIGMA", default_value_t = PsfParams::DEFAULT_SIGMA, allow_negative_numbers = true)]
    psf: f64,

    /// DLP response model
    #[arg(long, num_args = 3, value_names = ["LPEAK", "LBLACK", "GAMMA"], allow_negative_numbers = true)]
    dlp: Option<Vec<f64>>,

    /// LCD response model
    #[arg(long, num_args = 3, value_names = ["LPEAK", "LBLACK", "GAMMA"], allow_negative_numbers = true)]
    lcd: Option<Vec<f64>>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Number of threads (0 = auto)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,

    /// Also append log output to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Rewrites the single-dash long options to their `--` form.
fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| match arg.to_str() {
            Some(s) if LEGACY_OPTIONS.contains(&s) => OsString::from(format!("-{s}")),
            _ => arg,
        })
        .collect()
}

fn init_tracing(verbose: bool, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    use tracing_subscriber::prelude::*;

    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let (file_layer, guard) = match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

/// Output format, falling back to png for unsupported values.
fn output_format(requested: &str) -> String {
    if is_supported_format(requested) {
        requested.to_lowercase()
    } else {
        warn!("{requested} is not supported, using png instead");
        "png".to_string()
    }
}

/// `<stem>_<layer>.<format>` in the current directory.
fn layer_path(input: &Path, layer: &str, format: &str) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    PathBuf::from(format!("{stem}_{layer}.{format}"))
}

fn response_params(values: Option<&[f64]>, default: ResponseParams) -> ResponseParams {
    match values {
        Some(&[peak, black, gamma]) => ResponseParams::new(peak, black, gamma),
        _ => default,
    }
}

/// Parsed models, owned here and borrowed by the display algorithm.
struct Models {
    psf: GaussianPsf,
    dlp: GainOffsetGamma,
    lcd: GainOffsetGamma,
}

fn build_models(cli: &Cli, channels: usize) -> Result<Models> {
    let psf = GaussianPsf::new(PsfParams::from_sigma(cli.psf, channels))
        .context("Invalid -psf parameter")?;
    let dlp = GainOffsetGamma::new(response_params(
        cli.dlp.as_deref(),
        ResponseParams::DLP_DEFAULT,
    ))
    .context("Invalid -dlp parameters")?;
    let lcd = GainOffsetGamma::new(response_params(
        cli.lcd.as_deref(),
        ResponseParams::LCD_DEFAULT,
    ))
    .context("Invalid -lcd parameters")?;
    Ok(Models { psf, dlp, lcd })
}

fn load(input: &Path, res: Option<&[usize]>) -> Result<DenseImage> {
    let (width, height) = match res {
        Some(&[w, h]) => (w, h),
        _ => (0, 0),
    };
    let image = read_image(input, height, width)
        .with_context(|| format!("Unable to load image {}", input.display()))?;
    info!(
        height = image.height(),
        width = image.width(),
        channels = image.channels(),
        "image loaded"
    );
    Ok(image)
}

fn save(image: &DenseImage, path: &Path, layer: &str) -> bool {
    match write_image(image, path).with_context(|| format!("Unable to save {layer} image")) {
        Ok(()) => {
            info!(path = %path.display(), "{layer} image saved");
            true
        }
        Err(e) => {
            error!("{e:#}");
            false
        }
    }
}

fn run(cli: &Cli) -> ExitCode {
    let Some(input) = cli.input.as_deref() else {
        error!("error parsing input image: -in option not found");
        // Usage goes to stdout like --help
        let _ = Cli::command().print_help();
        return ExitCode::from(EXIT_USAGE);
    };

    let format = output_format(&cli.out);

    if cli.threads > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(cli.threads)
            .build_global()
            .context("Failed to configure thread pool")
        {
            error!("{e:#}");
            return ExitCode::from(EXIT_BAD_ARGS);
        }
    }

    let hdr = match load(input, cli.res.as_deref()) {
        Ok(image) => image,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_LOAD_FAILED);
        }
    };

    // The PSF takes the channel count of the loaded image.
    let models = match build_models(cli, hdr.channels()) {
        Ok(models) => models,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_BAD_ARGS);
        }
    };
    debug!(psf = ?models.psf.params(), dlp = ?models.dlp.params(), lcd = ?models.lcd.params(), "models");

    let display = ProjectorDisplay::new(ProjectorParams {
        psf: &models.psf,
        dlp: &models.dlp,
        lcd: &models.lcd,
    });

    info!("processing hdr");
    let mut layers = match display.process(&hdr).context("Processing failed") {
        Ok(layers) => layers,
        Err(e) => {
            error!("{e:#}");
            return ExitCode::from(EXIT_BAD_ARGS);
        }
    };
    info!("done");

    // Layers are in [0, 1]; map linearly to [0, 255].
    layers.dlp.scale(255.0);
    layers.lcd.scale(255.0);

    let dlp_ok = save(&layers.dlp, &layer_path(input, "dlp", &format), "dlp");
    let lcd_ok = save(&layers.lcd, &layer_path(input, "lcd", &format), "lcd");

    if dlp_ok && lcd_ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_WRITE_FAILED)
    }
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse_from(normalize_args(std::env::args_os())) {
        Ok(cli) => cli,
        Err(e) => {
            // Help and version print to stdout and exit 0
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(EXIT_BAD_ARGS)
            } else {
                ExitCode::SUCCESS
            };
        }
    };

    let _guard = match init_tracing(cli.verbose, cli.log_file.as_deref()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("{e:#}");
            return ExitCode::from(EXIT_BAD_ARGS);
        }
    };

    run(&cli)
}
