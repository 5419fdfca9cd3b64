//! Host bus capabilities and the ready gate
//!
//! This module defines the traits a backend must implement to carry IT8951
//! frames, and the [`ReadyGate`] that polls the HRDY line between phases.

mod ready;
mod traits;

pub use ready::{ReadyGate, ReadyWait};
pub use traits::*;
