//! Framed host-interface transport
//!
//! [`FramedTransport`] owns a [`HostBus`] and turns it into the three frame
//! shapes the IT8951 understands:
//!
//! | Operation | Frames | Wire bytes per frame |
//! |-----------|--------|----------------------|
//! | [`write_words`](FramedTransport::write_words) | 1 | `pre_hi pre_lo (w_hi w_lo)*` |
//! | [`read_words`](FramedTransport::read_words) | 1 | `pre_hi pre_lo 00 00 (00 00)*` |
//! | [`write_packed_pixel_bytes`](FramedTransport::write_packed_pixel_bytes) | 1 per pair | `00 00 p[i+1] p[i]` |
//!
//! Every frame follows the same sequence: wait for HRDY, assert CS, send the
//! preamble MSB first, wait for HRDY, run the data phase, de-assert CS.
//!
//! ## Byte order
//!
//! The word path sends each 16-bit value MSB first. The packed pixel path
//! sends the second byte of each pair first. The two conventions are kept as
//! separate operations; routing pixel data through the word path (or the
//! reverse) changes what the controller sees.

#[cfg(feature = "alloc")]
use alloc::vec::Vec;

use crate::bus::{ChipSelect, HostBus, ReadyGate, ReadyWait};
use crate::error::{Error, Result};
use crate::preamble;

/// IT8951 host-interface transport over an owned bus handle
///
/// All operations take `&mut self`: one transport drives one bus, and a
/// frame always completes (or fails with CS released) before the next one
/// starts.
pub struct FramedTransport<B: HostBus> {
    bus: B,
    gate: ReadyGate,
}

impl<B: HostBus> FramedTransport<B> {
    /// Create a transport that waits for HRDY without a bound
    pub fn new(bus: B) -> Self {
        Self::with_ready_wait(bus, ReadyWait::Forever)
    }

    /// Create a transport with an explicit ready-wait policy
    pub fn with_ready_wait(bus: B, wait: ReadyWait) -> Self {
        Self {
            bus,
            gate: ReadyGate::new(wait),
        }
    }

    /// Get a reference to the underlying bus
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Get a mutable reference to the underlying bus
    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Release the bus handle (e.g. to tear it down)
    pub fn into_inner(self) -> B {
        self.bus
    }

    /// Tear the transport down, leaving the bus idle
    ///
    /// Calls [`ChipSelect::release`](crate::bus::ChipSelect::release) and
    /// then drops the bus.
    pub fn close(self) -> Result<()> {
        let mut bus = self.bus;
        log::trace!("it8951: closing transport");
        bus.release()
    }

    /// Block until the controller reports ready
    pub fn wait_ready(&mut self) -> Result<()> {
        let polls = self.gate.wait(&mut self.bus)?;
        if polls > 0 {
            log::trace!("it8951: ready after {} polls", polls);
        }
        Ok(())
    }

    /// Write a sequence of 16-bit words in one frame
    ///
    /// Wire bytes: preamble hi/lo, then each word hi/lo, in order.
    pub fn write_words(&mut self, preamble: u16, values: &[u16]) -> Result<()> {
        log::trace!(
            "it8951: write {} words ({} preamble 0x{:04X})",
            values.len(),
            preamble::name(preamble),
            preamble
        );
        self.frame(preamble, |t| {
            for &value in values {
                t.send_word(value)?;
            }
            Ok(())
        })
    }

    /// Read `values.len()` 16-bit words in one frame
    ///
    /// After the preamble the controller needs one dummy word of turnaround
    /// before it drives data; its echo is discarded. Each received pair is
    /// assembled MSB first.
    pub fn read_words(&mut self, preamble: u16, values: &mut [u16]) -> Result<()> {
        log::trace!(
            "it8951: read {} words ({} preamble 0x{:04X})",
            values.len(),
            preamble::name(preamble),
            preamble
        );
        self.frame(preamble, |t| {
            t.send_word(0x0000)?;
            t.wait_ready()?;
            for value in values.iter_mut() {
                *value = t.recv_word()?;
            }
            Ok(())
        })
    }

    /// Read `count` 16-bit words in one frame into a new buffer
    #[cfg(feature = "alloc")]
    pub fn read_words_vec(&mut self, preamble: u16, count: usize) -> Result<Vec<u16>> {
        let mut values = alloc::vec![0u16; count];
        self.read_words(preamble, &mut values)?;
        Ok(values)
    }

    /// Write packed pixel bytes, one frame per byte pair
    ///
    /// For every pair `(p[i], p[i+1])` this runs a complete frame with the
    /// write-data preamble and sends `p[i+1]` then `p[i]`. The buffer length
    /// must be even; an odd length is rejected before anything reaches the
    /// bus.
    ///
    /// Re-framing per pair is how the controller has always been driven on
    /// this path. It is much slower than a single [`write_words`] frame, but
    /// whether the controller treats both shapes the same has not been
    /// confirmed, so the per-pair framing is kept as is.
    ///
    /// [`write_words`]: FramedTransport::write_words
    pub fn write_packed_pixel_bytes(&mut self, pixels: &[u8]) -> Result<()> {
        if pixels.len() % 2 != 0 {
            return Err(Error::OddPixelCount(pixels.len()));
        }

        log::trace!(
            "it8951: write {} packed pixel bytes ({} frames)",
            pixels.len(),
            pixels.len() / 2
        );

        for pair in pixels.chunks_exact(2) {
            self.frame(preamble::WRITE_DATA, |t| {
                t.exchange(pair[1])?;
                t.exchange(pair[0])?;
                Ok(())
            })?;
        }
        Ok(())
    }

    /// Send a command code (command preamble, one word)
    pub fn send_command(&mut self, code: u16) -> Result<()> {
        self.write_words(preamble::COMMAND, &[code])
    }

    /// Send a command code followed by its arguments
    ///
    /// Each argument goes out in its own write-data frame.
    pub fn send_command_with_args(&mut self, code: u16, args: &[u16]) -> Result<()> {
        self.send_command(code)?;
        for &arg in args {
            self.write_data(&[arg])?;
        }
        Ok(())
    }

    /// Write data words (write-data preamble)
    pub fn write_data(&mut self, values: &[u16]) -> Result<()> {
        self.write_words(preamble::WRITE_DATA, values)
    }

    /// Read data words (read-data preamble)
    pub fn read_data(&mut self, values: &mut [u16]) -> Result<()> {
        self.read_words(preamble::READ_DATA, values)
    }

    /// Read `count` data words into a new buffer
    #[cfg(feature = "alloc")]
    pub fn read_data_vec(&mut self, count: usize) -> Result<Vec<u16>> {
        self.read_words_vec(preamble::READ_DATA, count)
    }

    /// Read a single data word
    pub fn read_word(&mut self) -> Result<u16> {
        let mut value = [0u16; 1];
        self.read_data(&mut value)?;
        Ok(value[0])
    }

    /// Run one frame: ready, CS low, preamble, ready, `data`, CS high
    ///
    /// CS is released even if a phase inside the frame fails; the first
    /// error wins.
    fn frame<F>(&mut self, preamble: u16, data: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.wait_ready()?;
        self.bus.set_cs(true)?;

        let result = self.frame_body(preamble, data);
        let release = self.bus.set_cs(false);

        if let Err(e) = result {
            log::debug!("it8951: frame 0x{:04X} aborted: {}", preamble, e);
        }
        result.and(release)
    }

    fn frame_body<F>(&mut self, preamble: u16, data: F) -> Result<()>
    where
        F: FnOnce(&mut Self) -> Result<()>,
    {
        self.send_word(preamble)?;
        self.wait_ready()?;
        data(self)
    }

    #[inline]
    fn exchange(&mut self, out: u8) -> Result<u8> {
        self.bus.exchange_byte(out)
    }

    /// Send a word MSB first, ignoring the echoed bytes
    fn send_word(&mut self, word: u16) -> Result<()> {
        let [hi, lo] = word.to_be_bytes();
        self.exchange(hi)?;
        self.exchange(lo)?;
        Ok(())
    }

    /// Clock in a word MSB first by sending two zero bytes
    fn recv_word(&mut self) -> Result<u16> {
        let hi = self.exchange(0x00)?;
        let lo = self.exchange(0x00)?;
        Ok(u16::from_be_bytes([hi, lo]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::{DuplexByteChannel, ReadySignal};
    use std::collections::VecDeque;
    use std::vec;
    use std::vec::Vec;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Ready(bool),
        Cs(bool),
        Tx(u8),
    }

    /// Minimal recording bus: scripted ready levels and receive bytes
    #[derive(Default)]
    struct RecordingBus {
        events: Vec<Event>,
        ready: VecDeque<bool>,
        rx: VecDeque<u8>,
        fail_on_tx: Option<usize>,
        sent: usize,
    }

    impl RecordingBus {
        fn with_rx(rx: &[u8]) -> Self {
            Self {
                rx: rx.iter().copied().collect(),
                ..Default::default()
            }
        }

        /// Transmitted bytes grouped by CS window
        ///
        /// Same rules as `SimBus::frames`: bytes outside a window are
        /// skipped and a window still open is not included.
        fn frames(&self) -> Vec<Vec<u8>> {
            let mut frames = Vec::new();
            let mut current: Option<Vec<u8>> = None;
            for event in &self.events {
                match *event {
                    Event::Cs(true) => current = Some(Vec::new()),
                    Event::Cs(false) => frames.extend(current.take()),
                    Event::Tx(b) => match current.as_mut() {
                        Some(frame) => frame.push(b),
                        None => log::warn!("byte 0x{:02X} sent outside a frame", b),
                    },
                    Event::Ready(_) => {}
                }
            }
            frames
        }
    }

    impl ReadySignal for RecordingBus {
        fn is_ready(&mut self) -> Result<bool> {
            let level = self.ready.pop_front().unwrap_or(true);
            self.events.push(Event::Ready(level));
            Ok(level)
        }
    }

    impl ChipSelect for RecordingBus {
        fn set_cs(&mut self, active: bool) -> Result<()> {
            self.events.push(Event::Cs(active));
            Ok(())
        }
    }

    impl DuplexByteChannel for RecordingBus {
        fn exchange_byte(&mut self, out: u8) -> Result<u8> {
            if self.fail_on_tx == Some(self.sent) {
                return Err(Error::BusTransferFailed);
            }
            self.sent += 1;
            self.events.push(Event::Tx(out));
            Ok(self.rx.pop_front().unwrap_or(0))
        }
    }

    #[test]
    fn test_write_words_single_frame() {
        let mut t = FramedTransport::new(RecordingBus::default());
        t.write_words(0x6000, &[0x0302, 0xABCD]).unwrap();

        let bus = t.into_inner();
        assert_eq!(
            bus.frames(),
            vec![vec![0x60, 0x00, 0x03, 0x02, 0xAB, 0xCD]]
        );
        assert_eq!(
            bus.events,
            vec![
                Event::Ready(true),
                Event::Cs(true),
                Event::Tx(0x60),
                Event::Tx(0x00),
                Event::Ready(true),
                Event::Tx(0x03),
                Event::Tx(0x02),
                Event::Tx(0xAB),
                Event::Tx(0xCD),
                Event::Cs(false),
            ]
        );
    }

    #[test]
    fn test_write_words_empty() {
        let mut t = FramedTransport::new(RecordingBus::default());
        t.write_words(0x0000, &[]).unwrap();
        assert_eq!(t.into_inner().frames(), vec![vec![0x00, 0x00]]);
    }

    #[test]
    fn test_read_words_reconstruction() {
        // preamble echo, dummy word echo, then data
        let rx = [0xEE, 0xEE, 0x55, 0x55, 0x12, 0x34, 0xFF, 0x01];
        let mut t = FramedTransport::new(RecordingBus::with_rx(&rx));
        let mut values = [0u16; 2];
        t.read_words(0x1000, &mut values).unwrap();

        assert_eq!(values, [0x1234, 0xFF01]);

        let bus = t.into_inner();
        assert_eq!(
            bus.frames(),
            vec![vec![0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]]
        );
        // ready before CS, after preamble, after dummy word
        let readies = bus
            .events
            .iter()
            .filter(|e| matches!(e, Event::Ready(_)))
            .count();
        assert_eq!(readies, 3);
        assert_eq!(bus.events[4], Event::Ready(true));
        assert_eq!(bus.events[7], Event::Ready(true));
    }

    #[test]
    fn test_packed_pixels_per_pair_frames() {
        let mut t = FramedTransport::new(RecordingBus::default());
        t.write_packed_pixel_bytes(&[0xA1, 0xB2, 0xC3, 0xD4]).unwrap();

        assert_eq!(
            t.into_inner().frames(),
            vec![vec![0x00, 0x00, 0xB2, 0xA1], vec![0x00, 0x00, 0xD4, 0xC3]]
        );
    }

    #[test]
    fn test_packed_pixels_odd_length_rejected() {
        let mut t = FramedTransport::new(RecordingBus::default());
        let result = t.write_packed_pixel_bytes(&[1, 2, 3]);

        assert_eq!(result, Err(Error::OddPixelCount(3)));
        assert!(t.bus().events.is_empty());
    }

    #[test]
    fn test_no_byte_before_ready() {
        let mut bus = RecordingBus::default();
        bus.ready = VecDeque::from(vec![false, false, false]);
        let mut t = FramedTransport::new(bus);
        t.write_words(0x0000, &[0x0001]).unwrap();

        let events = &t.bus().events;
        assert_eq!(
            &events[..5],
            &[
                Event::Ready(false),
                Event::Ready(false),
                Event::Ready(false),
                Event::Ready(true),
                Event::Cs(true),
            ]
        );
    }

    #[test]
    fn test_bounded_wait_never_asserts_cs() {
        let mut bus = RecordingBus::default();
        bus.ready = VecDeque::from(vec![false; 8]);
        let mut t = FramedTransport::with_ready_wait(bus, ReadyWait::MaxPolls(4));

        assert_eq!(t.send_command(0x0001), Err(Error::ReadyTimeout));
        assert!(!t.bus().events.contains(&Event::Cs(true)));
    }

    #[test]
    fn test_cs_released_on_transfer_error() {
        let bus = RecordingBus {
            fail_on_tx: Some(3),
            ..Default::default()
        };
        let mut t = FramedTransport::new(bus);

        let result = t.write_words(0x0000, &[0x1122, 0x3344]);
        assert_eq!(result, Err(Error::BusTransferFailed));
        assert_eq!(t.bus().events.last(), Some(&Event::Cs(false)));
    }

    #[test]
    fn test_command_with_args_framing() {
        let mut t = FramedTransport::new(RecordingBus::default());
        t.send_command_with_args(0x0011, &[0x1234, 0x0001]).unwrap();

        assert_eq!(
            t.into_inner().frames(),
            vec![
                vec![0x60, 0x00, 0x00, 0x11],
                vec![0x00, 0x00, 0x12, 0x34],
                vec![0x00, 0x00, 0x00, 0x01],
            ]
        );
    }

    #[test]
    fn test_read_word_uses_read_preamble() {
        let rx = [0, 0, 0, 0, 0xBE, 0xEF];
        let mut t = FramedTransport::new(RecordingBus::with_rx(&rx));
        assert_eq!(t.read_word().unwrap(), 0xBEEF);
        assert_eq!(t.into_inner().frames()[0][..2], [0x10, 0x00]);
    }

    #[test]
    fn test_frames_skip_stray_bytes() {
        let mut bus = RecordingBus::default();
        bus.exchange_byte(0x42).unwrap();
        bus.set_cs(true).unwrap();
        bus.exchange_byte(0x01).unwrap();
        bus.set_cs(false).unwrap();
        bus.set_cs(true).unwrap();
        bus.exchange_byte(0x02).unwrap();

        assert_eq!(bus.frames(), vec![vec![0x01]]);
    }

    #[test]
    fn test_close_releases_cs() {
        let mut bus = RecordingBus::default();
        let mut t = FramedTransport::new(&mut bus);
        t.write_data(&[0x0001]).unwrap();
        t.close().unwrap();

        assert_eq!(bus.frames(), vec![vec![0x00, 0x00, 0x00, 0x01]]);
        assert_eq!(bus.events.last(), Some(&Event::Cs(false)));
        assert_eq!(
            bus.events.iter().filter(|e| **e == Event::Cs(false)).count(),
            2
        );
    }
}
