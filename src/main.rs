//! it8951 - IT8951 e-paper controller host-interface tool
//!
//! Drives the controller's SPI host interface from the command line: raw
//! word frames, commands with arguments, and packed pixel uploads.
//!
//! # Architecture
//!
//! Every bus backend (Linux spidev + GPIO, or the in-memory simulator)
//! implements the `HostBus` traits from it8951-core. Commands wrap the opened
//! bus in a `FramedTransport`, which owns the framing rules:
//!
//! - wait for HRDY before asserting chip-select
//! - send the 16-bit preamble, then wait for HRDY again
//! - move the data words MSB first, then release chip-select

mod buses;
mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use it8951_core::bus::ReadyWait;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    let ready_wait = cli
        .max_ready_polls
        .map(ReadyWait::MaxPolls)
        .unwrap_or_default();

    match cli.command {
        Commands::WriteWords {
            bus,
            preamble,
            words,
        } => commands::run_on_bus(&bus, ready_wait, |t| {
            commands::words::run_write_words(t, preamble, &words)
        }),
        Commands::ReadWords {
            bus,
            preamble,
            count,
        } => commands::run_on_bus(&bus, ready_wait, |t| {
            commands::words::run_read_words(t, preamble, count)
        }),
        Commands::Command { bus, code, args } => commands::run_on_bus(&bus, ready_wait, |t| {
            commands::words::run_command(t, code, &args)
        }),
        Commands::WritePixels { bus, input } => commands::run_on_bus(&bus, ready_wait, |t| {
            commands::pixels::run_write_pixels(t, &input)
        }),
        Commands::ListBuses => {
            commands::list_buses();
            Ok(())
        }
    }
}
