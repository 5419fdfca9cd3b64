//! it8951-core - Host-interface transport for the IT8951 e-paper controller
//!
//! This crate implements the framing the IT8951 expects on its SPI host
//! interface: a 16-bit preamble selecting the operation, a ready (HRDY)
//! handshake before every phase, and a chip-select window around each frame.
//! It is designed to be `no_std` compatible so the same transport can run on
//! a Linux host or on a microcontroller.
//!
//! # Features
//!
//! - `std` - Enable standard library support (includes `alloc`)
//! - `alloc` - Enable helpers that return owned `Vec<u16>` buffers
//!
//! # Example
//!
//! ```ignore
//! use it8951_core::{transport::FramedTransport, preamble};
//!
//! fn read_one<B: it8951_core::bus::HostBus>(bus: B) -> it8951_core::Result<u16> {
//!     let mut transport = FramedTransport::new(bus);
//!     transport.send_command(0x0302)?;
//!     transport.read_word()
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod bus;
pub mod error;
pub mod preamble;
pub mod transport;

pub use error::{Error, Result};
