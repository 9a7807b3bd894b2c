//! radiologo command-line flasher
//!
//! Loads a raw logo, converts it for the selected radio and either
//! simulates the upload or writes it over a serial port. Real writes
//! require `--write` plus the confirmation word.

mod console;
mod image;
mod settings;

use std::fs::File;
use std::io::{self, BufRead, BufWriter, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use log::{error, info, warn, LevelFilter};
use radiologo_core::safety::CONFIRMATION_TOKEN;
use radiologo_core::{find_model, models, SafetyContext, UploadSettings, Uploader};
use radiologo_hal_serialport::{list_ports, SerialPortTransport, StdTimer};
use radiologo_protocol::commands::{LOGO_HEIGHT, LOGO_WIDTH};
use radiologo_protocol::{AddressMode, PixelOrder, SourceLayout};

use crate::console::ConsoleObserver;
use crate::settings::HostSettings;

#[derive(Parser, Debug)]
#[command(version, about = "Flash a boot logo onto A5-protocol handheld radios")]
struct Args {
    /// Serial port the programming cable is attached to
    #[arg(short, long)]
    port: Option<String>,

    /// Radio model (see --list-models)
    #[arg(short, long)]
    model: Option<String>,

    /// Radio region or firmware variant
    #[arg(long)]
    region: Option<String>,

    /// Raw logo at the model's resolution
    #[arg(short, long)]
    image: Option<PathBuf>,

    /// Pixel layout of the raw logo
    #[arg(long, value_enum, default_value_t = Layout::Rgba)]
    layout: Layout,

    /// TOML file with saved settings
    #[arg(short, long)]
    settings: Option<PathBuf>,

    /// Store the effective port/model/wire options back into --settings
    #[arg(long, requires = "settings")]
    save_settings: bool,

    /// How data frame addresses are computed
    #[arg(long, value_enum)]
    address_mode: Option<AddressArg>,

    /// 16-bit pixel layout expected by the radio
    #[arg(long, value_enum)]
    pixel_order: Option<PixelArg>,

    /// Bytes per data frame
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Zero-pad the final data frame to the chunk size
    #[arg(long)]
    pad_last_chunk: bool,

    /// Build every frame without opening the port
    #[arg(long, conflicts_with = "write")]
    simulate: bool,

    /// Write the simulated frame stream to this file
    #[arg(long, requires = "simulate")]
    frames_out: Option<PathBuf>,

    /// Enable writing to the radio
    #[arg(long)]
    write: bool,

    /// Confirmation word, prompted for when omitted on a terminal
    #[arg(long)]
    confirm: Option<String>,

    /// List known radio models and exit
    #[arg(long)]
    list_models: bool,

    /// List serial ports and exit
    #[arg(long)]
    list_ports: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<LevelFilter>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Layout {
    Rgba,
    Rgb,
}

impl From<Layout> for SourceLayout {
    fn from(layout: Layout) -> Self {
        match layout {
            Layout::Rgba => SourceLayout::Rgba8888,
            Layout::Rgb => SourceLayout::Rgb888,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AddressArg {
    ByteOffset,
    ChunkIndex,
}

impl From<AddressArg> for AddressMode {
    fn from(arg: AddressArg) -> Self {
        match arg {
            AddressArg::ByteOffset => AddressMode::ByteOffset,
            AddressArg::ChunkIndex => AddressMode::ChunkIndex,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PixelArg {
    Rgb565,
    Bgr565,
}

impl From<PixelArg> for PixelOrder {
    fn from(arg: PixelArg) -> Self {
        match arg {
            PixelArg::Rgb565 => PixelOrder::Rgb565,
            PixelArg::Bgr565 => PixelOrder::Bgr565,
        }
    }
}

impl Args {
    /// Settings given on the command line
    fn overrides(&self) -> HostSettings {
        HostSettings {
            port: self.port.clone(),
            model: self.model.clone(),
            region: self.region.clone(),
            address_mode: self.address_mode.map(Into::into),
            pixel_order: self.pixel_order.map(Into::into),
            chunk_size: self.chunk_size,
        }
    }
}

fn init_logger(level: Option<LevelFilter>) {
    let mut builder = match level {
        Some(level) => {
            let mut builder = env_logger::Builder::new();
            builder.filter_level(level);
            builder
        }
        None => env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")),
    };
    builder.format_timestamp_millis().init();
}

fn print_models() {
    for model in models() {
        println!(
            "{:<12} {} {}x{} @ {} baud",
            model.name, model.vendor, model.logo_width, model.logo_height, model.baud_rate
        );
    }
}

fn print_ports() -> Result<()> {
    let ports = list_ports().context("failed to enumerate serial ports")?;
    if ports.is_empty() {
        println!("no serial ports found");
    }
    for port in ports {
        println!("{}", port);
    }
    Ok(())
}

/// Ask for the confirmation word on the terminal
fn prompt_confirmation() -> Result<String> {
    eprint!("Type {} to flash the logo: ", CONFIRMATION_TOKEN);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read confirmation")?;
    Ok(line.trim().to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_level);

    if args.list_models {
        print_models();
        return Ok(());
    }
    if args.list_ports {
        return print_ports();
    }

    let mut host = match &args.settings {
        Some(path) => HostSettings::load(path)?,
        None => HostSettings::default(),
    };
    host.overlay(args.overrides());

    if args.save_settings {
        if let Some(path) = &args.settings {
            host.save(path)?;
            info!("settings saved to {}", path.display());
        }
    }

    let model_name = host.model.clone().unwrap_or_default();
    let model = find_model(&model_name);
    if model.is_none() && !model_name.is_empty() {
        warn!("model {:?} is not in the registry, see --list-models", model_name);
    }

    let mut upload = host.apply(model.map_or_else(UploadSettings::default, |m| m.upload_settings()));
    upload.pad_last_chunk = args.pad_last_chunk;
    let resolution = model.map_or((LOGO_WIDTH, LOGO_HEIGHT), |m| (m.logo_width, m.logo_height));

    let image_path = args.image.as_deref().context("no logo given, use --image")?;
    let payload = image::load_logo(
        image_path,
        args.layout.into(),
        resolution,
        upload.pixel_order,
    )?;
    info!(
        "loaded {} ({} bytes after conversion)",
        image_path.display(),
        payload.len()
    );

    let port = host.port.clone().unwrap_or_default();
    if args.write && port.is_empty() {
        bail!("no serial port given, use --port or --list-ports");
    }

    let interactive = io::stdin().is_terminal();
    let confirmation = match args.confirm.clone() {
        Some(token) => Some(token),
        None if args.write && interactive => Some(prompt_confirmation()?),
        None => None,
    };

    let ctx = SafetyContext {
        write_enabled: args.write,
        confirmation_token: confirmation.as_deref(),
        interactive,
        model_detected: model.map_or("", |m| m.name),
        region_known: host.region_known(),
        simulate: args.simulate,
    };

    let frames_out = match &args.frames_out {
        Some(path) => Some(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => None,
    };
    let mut observer = ConsoleObserver::new(frames_out);

    let mut uploader = Uploader::new(SerialPortTransport::new(port), StdTimer::new(), upload);
    let report = match uploader.upload(&ctx, &payload, &mut observer) {
        Ok(report) => report,
        Err(e) => {
            if e.flash_may_be_incomplete() {
                error!("the radio may now hold a partial logo, run the upload again");
            }
            return Err(e).context("logo upload failed");
        }
    };

    let frames = observer.finish().context("failed to write frame stream")?;
    if report.simulated {
        info!(
            "simulation finished: {} data frames, {} writes",
            report.frames_sent, frames
        );
        if let Some(path) = &args.frames_out {
            info!("frame stream written to {}", path.display());
        }
    } else {
        info!(
            "logo flashed: {} frames, {} bytes in {} attempt(s)",
            report.frames_sent, report.bytes_sent, report.attempts
        );
    }
    Ok(())
}
