//! Host-interface preamble codes
//!
//! Every frame starts with one of these 16-bit codes, sent MSB first. They
//! tell the controller how to interpret the rest of the frame.

/// The following word is a command code
pub const COMMAND: u16 = 0x6000;

/// The following words are data written to the controller
pub const WRITE_DATA: u16 = 0x0000;

/// The controller returns data words after a dummy turnaround word
pub const READ_DATA: u16 = 0x1000;

/// Human-readable name for a known preamble (for logging)
pub fn name(preamble: u16) -> &'static str {
    match preamble {
        COMMAND => "command",
        WRITE_DATA => "write-data",
        READ_DATA => "read-data",
        _ => "custom",
    }
}
