//! Linux host bus for the IT8951
//!
//! This module provides `LinuxHostBus`, which owns the spidev channel and the
//! GPIO lines and implements the it8951-core bus traits on top of them.
//! Opening it is the bring-up step; [`LinuxHostBus::close`] is the teardown.
//! Dropping the bus (or calling `ChipSelect::release` through a boxed
//! `HostBus`) runs the same teardown once.

use crate::error::{LinuxHostError, Result};
use crate::gpio::HostLines;
use crate::spi::{self, LinuxSpi, DEFAULT_SPEED_HZ};

use gpiocdev::line::Offset;

use it8951_core::bus::{ChipSelect, DuplexByteChannel, ReadySignal};
use it8951_core::error::{Error as CoreError, Result as CoreResult};

/// Default spidev device (bus 0, device 0)
pub const DEFAULT_SPI_DEVICE: &str = "/dev/spidev0.0";

/// Default GPIO chip
pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";

/// Default line offsets (BCM numbering on a Raspberry Pi HAT)
pub mod pins {
    use gpiocdev::line::Offset;

    /// Chip-select (CE0)
    pub const CS: Offset = 8;
    /// Host ready
    pub const HRDY: Offset = 24;
    /// Controller reset
    pub const RESET: Offset = 17;
}

/// Configuration for bringing up a Linux host bus
#[derive(Debug, Clone)]
pub struct LinuxHostConfig {
    /// spidev path (e.g., "/dev/spidev0.0")
    pub spi_device: String,
    /// GPIO chip path (e.g., "/dev/gpiochip0")
    pub gpio_chip: String,
    /// Chip-select line offset
    pub cs: Offset,
    /// HRDY line offset
    pub hrdy: Offset,
    /// RESET line offset, if wired
    pub reset: Option<Offset>,
    /// SPI clock speed in Hz
    pub speed_hz: u32,
}

impl Default for LinuxHostConfig {
    fn default() -> Self {
        Self {
            spi_device: DEFAULT_SPI_DEVICE.to_string(),
            gpio_chip: DEFAULT_GPIO_CHIP.to_string(),
            cs: pins::CS,
            hrdy: pins::HRDY,
            reset: Some(pins::RESET),
            speed_hz: DEFAULT_SPEED_HZ,
        }
    }
}

impl LinuxHostConfig {
    /// Create a configuration for the given spidev path with default wiring
    pub fn new(spi_device: impl Into<String>) -> Self {
        Self {
            spi_device: spi_device.into(),
            ..Default::default()
        }
    }

    /// Set the GPIO chip path
    pub fn with_gpio_chip(mut self, chip: impl Into<String>) -> Self {
        self.gpio_chip = chip.into();
        self
    }

    /// Set the chip-select and HRDY line offsets
    pub fn with_lines(mut self, cs: Offset, hrdy: Offset) -> Self {
        self.cs = cs;
        self.hrdy = hrdy;
        self
    }

    /// Set (or clear) the RESET line offset
    pub fn with_reset(mut self, reset: Option<Offset>) -> Self {
        self.reset = reset;
        self
    }

    /// Set the SPI clock speed in Hz
    pub fn with_speed(mut self, speed_hz: u32) -> Self {
        self.speed_hz = speed_hz;
        self
    }
}

/// IT8951 host bus on Linux: spidev data lines plus GPIO CS/HRDY/RESET
pub struct LinuxHostBus {
    spi: LinuxSpi,
    lines: HostLines,
    closed: bool,
}

impl LinuxHostBus {
    /// Bring up the bus
    ///
    /// Configures the SPI device, requests the GPIO lines with CS
    /// de-asserted, and pulses RESET if one is configured. Nothing is left
    /// half-open on failure: already-acquired handles are dropped.
    pub fn open(config: &LinuxHostConfig) -> Result<Self> {
        if config.spi_device.is_empty() {
            return Err(LinuxHostError::InvalidParameter(
                "no SPI device specified".into(),
            ));
        }
        if config.speed_hz == 0 {
            return Err(LinuxHostError::InvalidParameter(
                "SPI speed must be non-zero".into(),
            ));
        }

        let spi = LinuxSpi::open(&config.spi_device, config.speed_hz)?;
        let lines = HostLines::request(&config.gpio_chip, config.cs, config.hrdy, config.reset)?;

        if lines.has_reset() {
            lines.pulse_reset()?;
        }

        log::info!(
            "it8951: Opened {} + {} (cs={}, hrdy={}, speed={} kHz)",
            config.spi_device,
            config.gpio_chip,
            config.cs,
            config.hrdy,
            config.speed_hz / 1000
        );

        Ok(Self {
            spi,
            lines,
            closed: false,
        })
    }

    /// Open with default wiring on the given spidev path
    pub fn open_device(spi_device: &str) -> Result<Self> {
        Self::open(&LinuxHostConfig::new(spi_device))
    }

    /// Pulse the controller's RESET line (no-op without one)
    pub fn reset_controller(&mut self) -> Result<()> {
        self.lines.pulse_reset()
    }

    /// Get the SPI clock speed in Hz
    pub fn speed_hz(&self) -> u32 {
        self.spi.speed_hz()
    }

    /// Tear down the bus
    ///
    /// Leaves CS de-asserted and releases the spidev file and the GPIO line
    /// request.
    pub fn close(mut self) -> Result<()> {
        self.teardown()
    }

    /// De-assert CS once; later calls do nothing
    fn teardown(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let result = self.lines.set_cs(false);
        log::info!("it8951: Closed host bus");
        result
    }
}

impl Drop for LinuxHostBus {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            log::warn!("it8951: teardown failed: {}", e);
        }
    }
}

impl ReadySignal for LinuxHostBus {
    fn is_ready(&mut self) -> CoreResult<bool> {
        self.lines.ready().map_err(|e| {
            log::error!("{}", e);
            CoreError::ReadySignalFailed
        })
    }
}

impl ChipSelect for LinuxHostBus {
    fn set_cs(&mut self, active: bool) -> CoreResult<()> {
        self.lines.set_cs(active).map_err(|e| {
            log::error!("{}", e);
            CoreError::ChipSelectFailed
        })
    }

    fn release(&mut self) -> CoreResult<()> {
        self.teardown().map_err(|e| {
            log::error!("{}", e);
            CoreError::ChipSelectFailed
        })
    }
}

impl DuplexByteChannel for LinuxHostBus {
    fn exchange_byte(&mut self, out: u8) -> CoreResult<u8> {
        self.spi.transfer_byte(out).map_err(|e| {
            log::error!("{}", e);
            CoreError::BusTransferFailed
        })
    }
}

/// Parse host bus options from a list of key-value pairs
///
/// # Supported Options
///
/// - `dev=/dev/spidevX.Y` or `spidev=...` - SPI device (default /dev/spidev0.0)
/// - `gpiochip=N` or `gpiochip=/dev/gpiochipN` - GPIO chip (default 0)
/// - `cs=N` - chip-select line offset (default 8)
/// - `hrdy=N` - HRDY line offset (default 24)
/// - `reset=N` or `reset=none` - RESET line offset (default 17)
/// - `spispeed=N` - SPI speed in kHz
/// - `divider=N` - BCM2835 clock divider (alternative to spispeed)
pub fn parse_options(options: &[(&str, &str)]) -> std::result::Result<LinuxHostConfig, String> {
    let mut config = LinuxHostConfig::default();
    let mut speed_set = false;
    let mut divider_set = false;

    for (key, value) in options {
        match *key {
            "dev" | "spidev" => {
                config.spi_device = value.to_string();
            }
            "gpiochip" => {
                config.gpio_chip = if value.starts_with('/') {
                    value.to_string()
                } else {
                    let n: u32 = value
                        .parse()
                        .map_err(|_| format!("Invalid gpiochip value: {}", value))?;
                    format!("/dev/gpiochip{}", n)
                };
            }
            "cs" => {
                config.cs = value
                    .parse()
                    .map_err(|_| format!("Invalid cs value: {}", value))?;
            }
            "hrdy" => {
                config.hrdy = value
                    .parse()
                    .map_err(|_| format!("Invalid hrdy value: {}", value))?;
            }
            "reset" => {
                config.reset = match *value {
                    "none" | "off" => None,
                    v => Some(
                        v.parse()
                            .map_err(|_| format!("Invalid reset value: {}", v))?,
                    ),
                };
            }
            "spispeed" => {
                let speed_khz: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid spispeed value: {}", value))?;
                if speed_khz == 0 {
                    return Err("spispeed must be non-zero".to_string());
                }
                config.speed_hz = speed_khz
                    .checked_mul(1000)
                    .ok_or_else(|| format!("spispeed too large: {}", value))?;
                speed_set = true;
            }
            "divider" => {
                let divider: u32 = value
                    .parse()
                    .map_err(|_| format!("Invalid divider value: {}", value))?;
                config.speed_hz = spi::speed_from_divider(divider)
                    .ok_or_else(|| "divider must be non-zero".to_string())?;
                divider_set = true;
            }
            _ => {
                log::warn!("it8951 linux: Unknown option: {}={}", key, value);
            }
        }
    }

    if speed_set && divider_set {
        return Err("Only one of 'spispeed' or 'divider' can be specified".to_string());
    }
    if config.spi_device.is_empty() {
        return Err("No device specified. Use dev=/dev/spidevX.Y".to_string());
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_wiring() {
        let config = parse_options(&[]).unwrap();
        assert_eq!(config.spi_device, "/dev/spidev0.0");
        assert_eq!(config.gpio_chip, "/dev/gpiochip0");
        assert_eq!(config.cs, 8);
        assert_eq!(config.hrdy, 24);
        assert_eq!(config.reset, Some(17));
        assert_eq!(config.speed_hz, 7_812_500);
    }

    #[test]
    fn test_parse_all_options() {
        let config = parse_options(&[
            ("dev", "/dev/spidev1.0"),
            ("gpiochip", "4"),
            ("cs", "7"),
            ("hrdy", "25"),
            ("reset", "none"),
            ("spispeed", "2000"),
        ])
        .unwrap();

        assert_eq!(config.spi_device, "/dev/spidev1.0");
        assert_eq!(config.gpio_chip, "/dev/gpiochip4");
        assert_eq!(config.cs, 7);
        assert_eq!(config.hrdy, 25);
        assert_eq!(config.reset, None);
        assert_eq!(config.speed_hz, 2_000_000);
    }

    #[test]
    fn test_parse_divider() {
        let config = parse_options(&[("divider", "64")]).unwrap();
        assert_eq!(config.speed_hz, 3_906_250);

        assert!(parse_options(&[("divider", "0")]).is_err());
        assert!(parse_options(&[("divider", "16"), ("spispeed", "1000")]).is_err());
    }

    #[test]
    fn test_parse_gpiochip_path() {
        let config = parse_options(&[("gpiochip", "/dev/gpiochip2")]).unwrap();
        assert_eq!(config.gpio_chip, "/dev/gpiochip2");
    }

    #[test]
    fn test_parse_invalid_values() {
        assert!(parse_options(&[("cs", "x")]).is_err());
        assert!(parse_options(&[("hrdy", "-1")]).is_err());
        assert!(parse_options(&[("spispeed", "0")]).is_err());
        assert_eq!(
            parse_options(&[("spispeed", "5000000")]).unwrap_err(),
            "spispeed too large: 5000000"
        );
        assert_eq!(
            parse_options(&[("spispeed", "4294967")]).unwrap().speed_hz,
            4_294_967_000
        );
        assert!(parse_options(&[("dev", "")]).is_err());
    }

    #[test]
    fn test_builder() {
        let config = LinuxHostConfig::new("/dev/spidev0.1")
            .with_gpio_chip("/dev/gpiochip1")
            .with_lines(5, 6)
            .with_reset(None)
            .with_speed(1_000_000);
        assert_eq!(config.spi_device, "/dev/spidev0.1");
        assert_eq!(config.gpio_chip, "/dev/gpiochip1");
        assert_eq!((config.cs, config.hrdy), (5, 6));
        assert_eq!(config.reset, None);
        assert_eq!(config.speed_hz, 1_000_000);
    }
}
