//! it8951-sim - Simulated IT8951 host bus for testing
//!
//! This crate provides a host bus that lives entirely in memory. It records
//! every ready sample, chip-select edge and byte exchange, so tests can check
//! the exact wire behavior of the transport without real hardware.
//!
//! Two receive models are available:
//!
//! - **Scripted**: received bytes come from a queue supplied by the test.
//! - **Loopback**: a tiny model of the controller's data FIFO. Words written
//!   with the write-data preamble are queued and handed back, in order, to
//!   later read-data frames.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "alloc")]
extern crate alloc;

#[cfg(feature = "alloc")]
use alloc::collections::VecDeque;
#[cfg(feature = "alloc")]
use alloc::vec::Vec;

#[cfg(feature = "alloc")]
use it8951_core::bus::{ChipSelect, DuplexByteChannel, ReadySignal};
#[cfg(feature = "alloc")]
use it8951_core::error::{Error, Result};
#[cfg(feature = "alloc")]
use it8951_core::preamble;

/// One observable action on the simulated bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    /// The ready line was sampled at this level
    ReadyPoll(bool),
    /// Chip-select changed (`true` = asserted/low)
    ChipSelect(bool),
    /// One byte was exchanged
    Exchange {
        /// Byte sent by the host
        tx: u8,
        /// Byte returned to the host
        rx: u8,
    },
}

/// How the simulated controller answers byte exchanges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimMode {
    /// Return bytes from the receive queue, zero once it is empty
    Scripted,
    /// Emulate the controller's data FIFO
    Loopback,
}

/// Per-frame decoder state for loopback mode
#[cfg(feature = "alloc")]
#[derive(Debug, Default)]
struct FrameState {
    /// Bytes sent by the host since CS was asserted
    tx: Vec<u8>,
    /// Low byte of the word currently being returned
    pending_lo: u8,
}

#[cfg(feature = "alloc")]
impl FrameState {
    fn preamble(&self) -> Option<u16> {
        match self.tx.as_slice() {
            [hi, lo, ..] => Some(u16::from_be_bytes([*hi, *lo])),
            _ => None,
        }
    }
}

/// In-memory host bus
#[cfg(feature = "alloc")]
pub struct SimBus {
    mode: SimMode,
    events: Vec<BusEvent>,
    ready_script: VecDeque<bool>,
    idle_ready: bool,
    rx_queue: VecDeque<u8>,
    fifo: VecDeque<u16>,
    commands: Vec<u16>,
    frame: Option<FrameState>,
    fail_after: Option<usize>,
    exchanges: usize,
}

#[cfg(feature = "alloc")]
impl SimBus {
    fn new(mode: SimMode) -> Self {
        Self {
            mode,
            events: Vec::new(),
            ready_script: VecDeque::new(),
            idle_ready: true,
            rx_queue: VecDeque::new(),
            fifo: VecDeque::new(),
            commands: Vec::new(),
            frame: None,
            fail_after: None,
            exchanges: 0,
        }
    }

    /// Create a bus that answers from a receive queue
    pub fn scripted() -> Self {
        Self::new(SimMode::Scripted)
    }

    /// Create a bus that emulates the controller's data FIFO
    pub fn loopback() -> Self {
        Self::new(SimMode::Loopback)
    }

    /// Get the receive model
    pub fn mode(&self) -> SimMode {
        self.mode
    }

    /// Queue bytes to return from exchanges (scripted mode)
    pub fn push_rx(&mut self, bytes: &[u8]) {
        self.rx_queue.extend(bytes.iter().copied());
    }

    /// Queue ready levels to report before falling back to the idle level
    pub fn push_ready(&mut self, levels: &[bool]) {
        self.ready_script.extend(levels.iter().copied());
    }

    /// Set the level reported once the ready script is exhausted
    pub fn set_idle_ready(&mut self, ready: bool) {
        self.idle_ready = ready;
    }

    /// Fail every exchange after `count` successful ones
    pub fn fail_after(&mut self, count: usize) {
        self.fail_after = Some(count);
    }

    /// Everything observed so far
    pub fn events(&self) -> &[BusEvent] {
        &self.events
    }

    /// Forget recorded events (FIFO and scripts are kept)
    pub fn clear_events(&mut self) {
        self.events.clear();
    }

    /// Command words received with the command preamble (loopback mode)
    pub fn commands(&self) -> &[u16] {
        &self.commands
    }

    /// Words waiting in the emulated data FIFO (loopback mode)
    pub fn fifo(&self) -> impl Iterator<Item = u16> + '_ {
        self.fifo.iter().copied()
    }

    /// Whether chip-select is currently asserted
    pub fn in_frame(&self) -> bool {
        self.frame.is_some()
    }

    /// Host bytes grouped by chip-select window, in order
    ///
    /// A window that is still open is not included.
    pub fn frames(&self) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        let mut current: Option<Vec<u8>> = None;

        for event in &self.events {
            match *event {
                BusEvent::ChipSelect(true) => current = Some(Vec::new()),
                BusEvent::ChipSelect(false) => frames.extend(current.take()),
                BusEvent::Exchange { tx, .. } => match current.as_mut() {
                    Some(frame) => frame.push(tx),
                    None => log::warn!("sim: byte 0x{:02X} sent outside a frame", tx),
                },
                BusEvent::ReadyPoll(_) => {}
            }
        }
        frames
    }

    /// All host bytes, ignoring framing
    pub fn tx_bytes(&self) -> Vec<u8> {
        self.events
            .iter()
            .filter_map(|e| match *e {
                BusEvent::Exchange { tx, .. } => Some(tx),
                _ => None,
            })
            .collect()
    }

    /// Compute the loopback answer for the next host byte
    fn loopback_rx(&mut self, tx: u8) -> u8 {
        let Some(frame) = self.frame.as_mut() else {
            return 0x00;
        };

        let index = frame.tx.len();
        frame.tx.push(tx);

        let Some(pre) = frame.preamble() else {
            return 0x00;
        };
        // Position within the data phase, counted after the preamble
        let Some(data_index) = index.checked_sub(2) else {
            return 0x00;
        };

        match pre {
            preamble::READ_DATA => {
                // The first word after the preamble is turnaround
                let Some(k) = data_index.checked_sub(2) else {
                    return 0x00;
                };
                if k % 2 == 0 {
                    let [hi, lo] = self.fifo.pop_front().unwrap_or(0).to_be_bytes();
                    frame.pending_lo = lo;
                    hi
                } else {
                    frame.pending_lo
                }
            }
            preamble::WRITE_DATA | preamble::COMMAND if data_index % 2 == 1 => {
                let word = u16::from_be_bytes([frame.tx[index - 1], frame.tx[index]]);
                if pre == preamble::COMMAND {
                    log::debug!("sim: command 0x{:04X}", word);
                    self.commands.push(word);
                } else {
                    self.fifo.push_back(word);
                }
                0x00
            }
            _ => 0x00,
        }
    }
}

#[cfg(feature = "alloc")]
impl Default for SimBus {
    fn default() -> Self {
        Self::loopback()
    }
}

#[cfg(feature = "alloc")]
impl ReadySignal for SimBus {
    fn is_ready(&mut self) -> Result<bool> {
        let level = self.ready_script.pop_front().unwrap_or(self.idle_ready);
        self.events.push(BusEvent::ReadyPoll(level));
        Ok(level)
    }
}

#[cfg(feature = "alloc")]
impl ChipSelect for SimBus {
    fn set_cs(&mut self, active: bool) -> Result<()> {
        self.events.push(BusEvent::ChipSelect(active));
        self.frame = if active {
            Some(FrameState::default())
        } else {
            None
        };
        Ok(())
    }
}

#[cfg(feature = "alloc")]
impl DuplexByteChannel for SimBus {
    fn exchange_byte(&mut self, out: u8) -> Result<u8> {
        if let Some(limit) = self.fail_after {
            if self.exchanges >= limit {
                return Err(Error::BusTransferFailed);
            }
        }
        self.exchanges += 1;

        let rx = match self.mode {
            SimMode::Scripted => self.rx_queue.pop_front().unwrap_or(0x00),
            SimMode::Loopback => self.loopback_rx(out),
        };
        self.events.push(BusEvent::Exchange { tx: out, rx });
        Ok(rx)
    }
}
