//! Error types for it8951-core
//!
//! This module provides a no_std compatible error type shared by the
//! transport and every host bus backend.

use core::fmt;

/// Core error type - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    // Bus errors
    /// A byte exchange on the serial bus failed
    BusTransferFailed,
    /// Driving the chip-select line failed
    ChipSelectFailed,
    /// Sampling the ready (HRDY) line failed
    ReadySignalFailed,
    /// The ready line stayed low for the whole bounded wait
    ReadyTimeout,

    // Argument errors
    /// Packed pixel buffers are consumed in pairs; the length was odd
    OddPixelCount(usize),
    /// Generic invalid argument
    InvalidArgument,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BusTransferFailed => write!(f, "bus transfer failed"),
            Self::ChipSelectFailed => write!(f, "failed to drive chip-select"),
            Self::ReadySignalFailed => write!(f, "failed to sample ready line"),
            Self::ReadyTimeout => write!(f, "timed out waiting for controller ready"),
            Self::OddPixelCount(len) => {
                write!(f, "packed pixel buffer has odd length {}", len)
            }
            Self::InvalidArgument => write!(f, "invalid argument"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
