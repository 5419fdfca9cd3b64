//! Ready (HRDY) handshake
//!
//! The IT8951 holds HRDY low while it is busy. The host must see it high
//! before asserting chip-select and again before each data phase. There is
//! no interrupt at this layer, so the gate busy-polls the line.

use super::ReadySignal;
use crate::error::{Error, Result};

/// How long the gate is willing to poll
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadyWait {
    /// Poll until the line goes high, however long that takes.
    ///
    /// A controller that never becomes ready blocks the caller forever.
    #[default]
    Forever,
    /// Give up with [`Error::ReadyTimeout`] after this many low samples
    MaxPolls(u32),
}

/// Barrier that blocks until the controller reports ready
#[derive(Debug, Clone, Copy, Default)]
pub struct ReadyGate {
    policy: ReadyWait,
}

impl ReadyGate {
    /// Create a gate with the given wait policy
    pub const fn new(policy: ReadyWait) -> Self {
        Self { policy }
    }

    /// Get the wait policy
    pub fn policy(&self) -> ReadyWait {
        self.policy
    }

    /// Poll `signal` until it reads high
    ///
    /// Returns the number of low samples seen before the line went high.
    /// No bus traffic is generated.
    pub fn wait<R: ReadySignal + ?Sized>(&self, signal: &mut R) -> Result<u32> {
        let mut low_polls = 0u32;
        loop {
            if signal.is_ready()? {
                return Ok(low_polls);
            }
            low_polls = low_polls.saturating_add(1);
            if let ReadyWait::MaxPolls(max) = self.policy {
                if low_polls >= max {
                    log::debug!("ready gate: line still low after {} polls", low_polls);
                    return Err(Error::ReadyTimeout);
                }
            }
            core::hint::spin_loop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reports low `busy` times, then high
    struct CountdownSignal {
        busy: u32,
        samples: u32,
    }

    impl ReadySignal for CountdownSignal {
        fn is_ready(&mut self) -> Result<bool> {
            self.samples += 1;
            if self.busy == 0 {
                Ok(true)
            } else {
                self.busy -= 1;
                Ok(false)
            }
        }
    }

    struct BrokenSignal;

    impl ReadySignal for BrokenSignal {
        fn is_ready(&mut self) -> Result<bool> {
            Err(Error::ReadySignalFailed)
        }
    }

    #[test]
    fn test_ready_immediately() {
        let mut signal = CountdownSignal { busy: 0, samples: 0 };
        let polls = ReadyGate::default().wait(&mut signal).unwrap();
        assert_eq!(polls, 0);
        assert_eq!(signal.samples, 1);
    }

    #[test]
    fn test_waits_until_high() {
        let mut signal = CountdownSignal { busy: 1000, samples: 0 };
        let polls = ReadyGate::new(ReadyWait::Forever)
            .wait(&mut signal)
            .unwrap();
        assert_eq!(polls, 1000);
        assert_eq!(signal.samples, 1001);
    }

    #[test]
    fn test_bounded_wait_times_out() {
        let mut signal = CountdownSignal { busy: 10, samples: 0 };
        let result = ReadyGate::new(ReadyWait::MaxPolls(5)).wait(&mut signal);
        assert_eq!(result, Err(Error::ReadyTimeout));
        assert_eq!(signal.samples, 5);
    }

    #[test]
    fn test_bounded_wait_succeeds_within_limit() {
        let mut signal = CountdownSignal { busy: 4, samples: 0 };
        let polls = ReadyGate::new(ReadyWait::MaxPolls(5))
            .wait(&mut signal)
            .unwrap();
        assert_eq!(polls, 4);
    }

    #[test]
    fn test_signal_error_propagates() {
        let result = ReadyGate::default().wait(&mut BrokenSignal);
        assert_eq!(result, Err(Error::ReadySignalFailed));
    }
}
