//! Host bus trait definitions
//!
//! The IT8951 host interface needs three physical capabilities. They are
//! split into separate traits so a backend can source them from different
//! drivers (e.g. spidev for the byte channel, a GPIO chip for the lines),
//! and so tests can substitute any one of them.
//!
//! [`HostBus`] bundles all three and is implemented automatically for any
//! type that provides them.

use crate::error::Result;

/// Single-bit ready (HRDY) input
///
/// The controller drives this line high when it can accept the next
/// transfer phase.
pub trait ReadySignal {
    /// Sample the ready line once; `true` means ready (logic high)
    fn is_ready(&mut self) -> Result<bool>;
}

/// Chip-select output framing one exchange
pub trait ChipSelect {
    /// Set chip select (CS is active low, so `active=true` means CS=0)
    fn set_cs(&mut self, active: bool) -> Result<()>;

    /// Leave the bus idle at teardown
    ///
    /// The default de-asserts CS. Backends that own OS handles override this
    /// to also log or release them.
    fn release(&mut self) -> Result<()> {
        self.set_cs(false)
    }
}

/// Full-duplex byte exchange on the serial bus
///
/// This is the only point of contact with the physical bus; every framed
/// operation is a sequence of calls to it. The bus must already be
/// configured (mode 0, MSB first) by the backend's bring-up.
pub trait DuplexByteChannel {
    /// Transmit `out` and return the byte sampled in the same clock window
    fn exchange_byte(&mut self, out: u8) -> Result<u8>;
}

/// Everything a [`FramedTransport`](crate::transport::FramedTransport) needs
pub trait HostBus: ReadySignal + ChipSelect + DuplexByteChannel {}

impl<T: ReadySignal + ChipSelect + DuplexByteChannel + ?Sized> HostBus for T {}

impl<T: ReadySignal + ?Sized> ReadySignal for &mut T {
    fn is_ready(&mut self) -> Result<bool> {
        (**self).is_ready()
    }
}

impl<T: ChipSelect + ?Sized> ChipSelect for &mut T {
    fn set_cs(&mut self, active: bool) -> Result<()> {
        (**self).set_cs(active)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

impl<T: DuplexByteChannel + ?Sized> DuplexByteChannel for &mut T {
    fn exchange_byte(&mut self, out: u8) -> Result<u8> {
        (**self).exchange_byte(out)
    }
}

// Boxed impls so backends can be chosen at runtime (`Box<dyn HostBus + Send>`)
#[cfg(feature = "alloc")]
impl<T: ReadySignal + ?Sized> ReadySignal for alloc::boxed::Box<T> {
    fn is_ready(&mut self) -> Result<bool> {
        (**self).is_ready()
    }
}

#[cfg(feature = "alloc")]
impl<T: ChipSelect + ?Sized> ChipSelect for alloc::boxed::Box<T> {
    fn set_cs(&mut self, active: bool) -> Result<()> {
        (**self).set_cs(active)
    }

    fn release(&mut self) -> Result<()> {
        (**self).release()
    }
}

#[cfg(feature = "alloc")]
impl<T: DuplexByteChannel + ?Sized> DuplexByteChannel for alloc::boxed::Box<T> {
    fn exchange_byte(&mut self, out: u8) -> Result<u8> {
        (**self).exchange_byte(out)
    }
}
