//! CLI command implementations
//!
//! Each command runs inside [`run_on_bus`], which opens the bus, wraps it in
//! a `FramedTransport`, and closes the transport afterwards so CS is left
//! de-asserted even when the command failed.

mod list;
pub mod pixels;
pub mod words;

pub use list::list_buses;

use crate::buses;
use it8951_core::bus::{HostBus, ReadyWait};
use it8951_core::transport::FramedTransport;

/// Transport over a bus chosen at runtime
pub type BusTransport = FramedTransport<Box<dyn HostBus>>;

/// Open `bus`, run `command` on it, then tear the transport down
///
/// A command error takes precedence over a teardown error.
pub fn run_on_bus<F>(
    bus: &str,
    ready_wait: ReadyWait,
    command: F,
) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(&mut BusTransport) -> Result<(), Box<dyn std::error::Error>>,
{
    let bus = buses::open_bus(bus)?;
    log::debug!("Ready wait policy: {:?}", ready_wait);
    let mut transport = FramedTransport::with_ready_wait(bus, ready_wait);

    let result = command(&mut transport);
    let closed = transport.close();
    result?;
    closed?;
    Ok(())
}
