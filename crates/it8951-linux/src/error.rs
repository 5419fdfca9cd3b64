//! Error types for Linux host bus bring-up and I/O

use thiserror::Error;

/// Linux host bus specific errors
#[derive(Debug, Error)]
pub enum LinuxHostError {
    /// Failed to open the spidev device
    #[error("Failed to open {path}: {source}")]
    OpenFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set SPI mode
    #[error("Failed to set SPI mode to 0x{mode:02X}: {source}")]
    SetModeFailed {
        mode: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to select MSB-first bit order
    #[error("Failed to set bit order: {0}")]
    SetBitOrderFailed(#[source] std::io::Error),

    /// Failed to set bits per word
    #[error("Failed to set bits per word to {bits}: {source}")]
    SetBitsPerWordFailed {
        bits: u8,
        #[source]
        source: std::io::Error,
    },

    /// Failed to set clock speed
    #[error("Failed to set clock speed to {speed} Hz: {source}")]
    SetSpeedFailed {
        speed: u32,
        #[source]
        source: std::io::Error,
    },

    /// SPI transfer failed
    #[error("SPI transfer failed: {0}")]
    TransferFailed(#[source] std::io::Error),

    /// Failed to request GPIO lines
    #[error("Failed to request GPIO lines on {chip}: {source}")]
    LineRequestFailed {
        chip: String,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to set GPIO line value
    #[error("Failed to set GPIO line {line}: {source}")]
    SetValueFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Failed to get GPIO line value
    #[error("Failed to read GPIO line {line}: {source}")]
    GetValueFailed {
        line: u32,
        #[source]
        source: gpiocdev::Error,
    },

    /// Two functions were assigned the same GPIO line
    #[error("GPIO line {line} assigned to both {first} and {second}")]
    LineConflict {
        line: u32,
        first: &'static str,
        second: &'static str,
    },

    /// Invalid parameter
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Result type for Linux host bus operations
pub type Result<T> = std::result::Result<T, LinuxHostError>;
