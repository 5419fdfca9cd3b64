//! it8951-linux - Linux host bus for the IT8951 e-paper controller
//!
//! This crate brings up the IT8951 host interface on a Linux board: the SPI
//! data lines through spidev (`/dev/spidevX.Y`) and the CS, HRDY and RESET
//! lines through the GPIO character device (`/dev/gpiochipN`).
//!
//! # Example
//!
//! ```no_run
//! use it8951_core::transport::FramedTransport;
//! use it8951_linux::{LinuxHostBus, LinuxHostConfig};
//!
//! // Default wiring: spidev0.0, CS=8, HRDY=24, RESET=17, 7.8 MHz
//! let bus = LinuxHostBus::open(&LinuxHostConfig::default())?;
//! let mut transport = FramedTransport::new(bus);
//!
//! transport.send_command(0x0302)?;
//! let mut info = [0u16; 20];
//! transport.read_data(&mut info)?;
//!
//! transport.into_inner().close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Usage with the it8951 CLI
//!
//! ```bash
//! it8951 read-words -b linux --preamble 0x1000 --count 1
//! it8951 write-pixels -b linux:dev=/dev/spidev0.0,hrdy=24,divider=16 -i frame.bin
//! ```
//!
//! # System Requirements
//!
//! - Linux kernel with spidev support enabled (`CONFIG_SPI_SPIDEV`)
//! - GPIO character device support (kernel 5.5+ for line bias)
//! - The CS line must not be claimed by the SPI controller. On a Raspberry
//!   Pi, load the SPI overlay without hardware chip-selects (for example
//!   `dtoverlay=spi0-0cs`) so GPIO 8 is free.

pub mod device;
pub mod error;
pub mod gpio;
pub mod spi;

// Re-exports
pub use device::{parse_options, pins, LinuxHostBus, LinuxHostConfig};
pub use error::{LinuxHostError, Result};

/// Open a Linux host bus and return it boxed
///
/// This is a convenience function for use in the CLI bus dispatch.
///
/// # Arguments
///
/// * `options` - Slice of (key, value) pairs from bus string parsing
pub fn open_linux_host(
    options: &[(&str, &str)],
) -> std::result::Result<Box<dyn it8951_core::bus::HostBus>, Box<dyn std::error::Error>> {
    let config = parse_options(options)?;
    let bus = LinuxHostBus::open(&config)?;
    Ok(Box::new(bus))
}
