use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser};
use daltonlens::{
    buffer::PixelBuffer,
    color::Transfer,
    config::{self, ProcessConfig},
    filter::{Backend, DaltonizeParams, Filter, FilterProcessor},
    hsv::{HsvParams, HueQuantization},
    simulation::Deficiency,
    utils::image::{read_png, write_png},
};
use log::LevelFilter;

/// Simulate colour vision deficiencies or daltonize an image.
#[derive(Parser)]
#[command(name = "daltonlens", version, about, long_about = None)]
struct Cli {
    input: PathBuf,
    output: PathBuf,

    /// JSON process configuration, flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// normal, daltonize, simulate, switch_cbcr, switch_and_flip_cbcr or hsv_transform
    #[arg(long)]
    filter: Option<String>,

    /// protanope, deuteranope or tritanope
    #[arg(long, value_parser = config::parse_deficiency)]
    deficiency: Option<Deficiency>,

    /// 0 keeps the image, 1 is full dichromacy
    #[arg(long)]
    severity: Option<f32>,

    /// Stop after the simulation
    #[arg(long)]
    simulate_only: bool,

    /// Hue rotation in turns, for hsv_transform
    #[arg(long, allow_hyphen_values = true)]
    hue_shift: Option<f32>,

    /// Saturation multiplier, for hsv_transform
    #[arg(long)]
    saturation_scale: Option<f32>,

    /// 0 (off), 1 or 2, for hsv_transform
    #[arg(long, value_parser = config::parse_hue_quantization)]
    hue_quantization: Option<HueQuantization>,

    /// legacy or srgb
    #[arg(long, value_parser = config::parse_transfer)]
    transfer: Option<Transfer>,

    /// cpu, cpu_par, auto_cpu, gpu or auto
    #[arg(long, value_parser = config::parse_backend)]
    backend: Option<Backend>,

    /// More output, repeat for more
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn process_config(&self) -> Result<ProcessConfig> {
        let mut process_config = match &self.config {
            Some(path) => ProcessConfig::read_config(path)
                .with_context(|| format!("reading config {}", path.display()))?,
            None => ProcessConfig::default(),
        };

        let base = match process_config.filter {
            Filter::Daltonize(params) => params,
            _ => DaltonizeParams::default(),
        };
        // An explicit daltonize only simulates when asked to on this command line
        let simulate_only = match self.filter.as_deref() {
            Some("daltonize") => self.simulate_only,
            _ => self.simulate_only || base.simulate_only,
        };
        let params = DaltonizeParams::clamped(
            self.deficiency.unwrap_or(base.deficiency),
            self.severity.unwrap_or(base.severity),
            simulate_only,
        );

        let hsv_base = match process_config.filter {
            Filter::HsvTransform(params) => params,
            _ => HsvParams::default(),
        };
        let hsv = HsvParams::clamped(
            self.hue_shift.unwrap_or(hsv_base.hue_shift),
            self.saturation_scale.unwrap_or(hsv_base.saturation_scale),
            self.hue_quantization.unwrap_or(hsv_base.hue_quantization),
        );

        process_config.filter = match (&self.filter, process_config.filter) {
            (Some(name), _) => config::parse_filter(name, params, hsv)?,
            (None, Filter::Daltonize(_)) => Filter::Daltonize(params),
            (None, Filter::HsvTransform(_)) => Filter::HsvTransform(hsv),
            (None, other) => other,
        };
        if let Some(transfer) = self.transfer {
            process_config.transfer = transfer;
        }
        if let Some(backend) = self.backend {
            process_config.backend = backend;
        }
        Ok(process_config)
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    let process_config = cli.process_config()?;
    log::info!(
        "{} with {:?} transfer on {:?}",
        process_config.filter,
        process_config.transfer,
        process_config.backend
    );

    let input = read_png(&cli.input).with_context(|| format!("reading {}", cli.input.display()))?;
    let mut output = PixelBuffer::empty();
    FilterProcessor::new(process_config.backend, process_config.transfer).process(
        &process_config.filter,
        &input,
        &mut output,
    )?;

    write_png(&output, &cli.output).with_context(|| format!("writing {}", cli.output.display()))?;
    Ok(())
}
