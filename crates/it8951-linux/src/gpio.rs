//! GPIO lines of the host interface
//!
//! The IT8951 host interface uses three GPIOs besides the SPI data lines:
//!
//! | Line  | Direction | Idle level | Purpose |
//! |-------|-----------|------------|---------|
//! | CS    | output    | high       | frames each exchange (active low) |
//! | HRDY  | input     | pulled low | controller ready for the next phase |
//! | RESET | output    | high       | optional hardware reset (active low) |
//!
//! Lines are requested through the GPIO character device (gpiocdev).

use crate::error::{LinuxHostError, Result};

use gpiocdev::line::{Bias, Offset, Value};
use gpiocdev::request::{Config, Request};

use std::time::Duration;

/// How long RESET is held low
pub const RESET_PULSE: Duration = Duration::from_millis(100);

/// Requested GPIO lines
pub struct HostLines {
    /// GPIO line request handle
    request: Request,
    cs: Offset,
    hrdy: Offset,
    reset: Option<Offset>,
}

impl HostLines {
    /// Request CS (high), HRDY (input, pull-down) and optionally RESET (high)
    pub fn request(
        chip: &str,
        cs: Offset,
        hrdy: Offset,
        reset: Option<Offset>,
    ) -> Result<Self> {
        check_distinct(cs, hrdy, reset)?;

        let mut config = Config::default();
        // Value::Active drives the line high (no active-low flag is set)
        config.with_line(cs).as_output(Value::Active);
        config
            .with_line(hrdy)
            .as_input()
            .with_bias(Bias::PullDown);
        if let Some(reset) = reset {
            config.with_line(reset).as_output(Value::Active);
        }

        let request = Request::from_config(config)
            .on_chip(chip)
            .with_consumer("it8951")
            .request()
            .map_err(|e| LinuxHostError::LineRequestFailed {
                chip: chip.to_string(),
                source: e,
            })?;

        log::debug!(
            "it8951 gpio: {} lines requested (cs={}, hrdy={}, reset={:?})",
            chip,
            cs,
            hrdy,
            reset
        );

        Ok(Self {
            request,
            cs,
            hrdy,
            reset,
        })
    }

    /// Drive CS; `active` pulls the line low
    pub fn set_cs(&self, active: bool) -> Result<()> {
        let value = if active {
            Value::Inactive
        } else {
            Value::Active
        };
        self.set(self.cs, value)
    }

    /// Sample HRDY
    pub fn ready(&self) -> Result<bool> {
        match self.request.value(self.hrdy) {
            Ok(value) => Ok(value == Value::Active),
            Err(e) => Err(LinuxHostError::GetValueFailed {
                line: self.hrdy,
                source: e,
            }),
        }
    }

    /// Whether a RESET line was requested
    pub fn has_reset(&self) -> bool {
        self.reset.is_some()
    }

    /// Pulse RESET low for [`RESET_PULSE`], then release it
    ///
    /// Does nothing if no RESET line was requested.
    pub fn pulse_reset(&self) -> Result<()> {
        let Some(reset) = self.reset else {
            log::debug!("it8951 gpio: no reset line configured");
            return Ok(());
        };

        log::debug!("it8951 gpio: pulsing reset line {}", reset);
        self.set(reset, Value::Inactive)?;
        std::thread::sleep(RESET_PULSE);
        self.set(reset, Value::Active)
    }

    fn set(&self, line: Offset, value: Value) -> Result<()> {
        self.request
            .set_value(line, value)
            .map(|_| ())
            .map_err(|e| LinuxHostError::SetValueFailed { line, source: e })
    }
}

/// Reject configurations that map two functions to one line
fn check_distinct(cs: Offset, hrdy: Offset, reset: Option<Offset>) -> Result<()> {
    if cs == hrdy {
        return Err(LinuxHostError::LineConflict {
            line: cs,
            first: "cs",
            second: "hrdy",
        });
    }
    if let Some(reset) = reset {
        if reset == cs {
            return Err(LinuxHostError::LineConflict {
                line: reset,
                first: "cs",
                second: "reset",
            });
        }
        if reset == hrdy {
            return Err(LinuxHostError::LineConflict {
                line: reset,
                first: "hrdy",
                second: "reset",
            });
        }
    }
    Ok(())
}
