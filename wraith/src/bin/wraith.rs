use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use wraith::{Config, Gameboy};

/// Runs a ROM without a screen. Useful for test ROMs that report over the link port.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// The path to the ROM to run.
    rom: PathBuf,
    /// The most frames to run before giving up.
    #[arg(long, default_value_t = 3600)]
    frames: u64,
    /// Stop as soon as this text shows up in the serial output. If it never does, the exit code
    /// is non-zero.
    #[arg(long)]
    until_serial: Option<String>,
    /// A TOML file with session settings.
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();
    let config = match args.config.as_deref().map(Config::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };
    let rom = match std::fs::read(&args.rom) {
        Ok(rom) => rom,
        Err(err) => {
            error!("Could not read {}: {err}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    let mut gb = match Gameboy::with_config(rom, config) {
        Ok(gb) => gb,
        Err(err) => {
            error!("Could not load {}: {err}", args.rom.display());
            return ExitCode::FAILURE;
        }
    };
    info!("Running {:?} for up to {} frames", gb.header().title, args.frames);

    let mut found = false;
    for _ in 0..args.frames {
        if let Err(err) = gb.next_frame() {
            print_serial(&gb);
            error!("{err}");
            return ExitCode::FAILURE;
        }
        if let Some(text) = &args.until_serial {
            if String::from_utf8_lossy(gb.serial_output()).contains(text.as_str()) {
                found = true;
                break;
            }
        }
    }
    print_serial(&gb);
    info!("Stopped after {} frames", gb.frame_count());
    match args.until_serial {
        Some(text) if !found => {
            error!("{text:?} never appeared in the serial output");
            ExitCode::FAILURE
        }
        _ => ExitCode::SUCCESS,
    }
}

fn print_serial(gb: &Gameboy) {
    let output = gb.serial_output();
    if !output.is_empty() {
        println!("{}", String::from_utf8_lossy(output));
    }
}
