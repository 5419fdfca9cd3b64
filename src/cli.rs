//! CLI argument parsing

use crate::buses;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Parse a string as a hex or decimal u16
pub fn parse_hex_u16(s: &str) -> Result<u16, String> {
    if let Some(hex) = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        u16::from_str_radix(hex, 16).map_err(|e| format!("Invalid hex value: {}", e))
    } else {
        s.parse::<u16>().map_err(|e| format!("Invalid number: {}", e))
    }
}

/// Generate dynamic help text for the bus argument
fn bus_help() -> String {
    format!("Bus to use [available: {}]", buses::bus_names_short())
}

#[derive(Parser)]
#[command(name = "it8951")]
#[command(author, version, about = "IT8951 e-paper host-interface tool", long_about = None)]
pub struct Cli {
    /// Verbosity level (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Give up after this many busy samples of the ready line (default: wait forever)
    #[arg(long, global = true)]
    pub max_ready_polls: Option<u32>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Write 16-bit words in a single frame
    WriteWords {
        /// Bus to use
        #[arg(short, long, help = bus_help())]
        bus: String,

        /// Preamble code (hex or decimal, e.g. 0x0000 for write data)
        #[arg(long, value_parser = parse_hex_u16)]
        preamble: u16,

        /// Words to send, in order
        #[arg(required = true, value_parser = parse_hex_u16)]
        words: Vec<u16>,
    },

    /// Read 16-bit words in a single frame
    ReadWords {
        /// Bus to use
        #[arg(short, long, help = bus_help())]
        bus: String,

        /// Preamble code (hex or decimal, e.g. 0x1000 for read data)
        #[arg(long, value_parser = parse_hex_u16, default_value = "0x1000")]
        preamble: u16,

        /// Number of words to read
        #[arg(short, long, default_value = "1")]
        count: usize,
    },

    /// Send a command code followed by its argument words
    Command {
        /// Bus to use
        #[arg(short, long, help = bus_help())]
        bus: String,

        /// Command code
        #[arg(value_parser = parse_hex_u16)]
        code: u16,

        /// Argument words, each sent in its own data frame
        #[arg(value_parser = parse_hex_u16)]
        args: Vec<u16>,
    },

    /// Upload packed pixel bytes from a file (one frame per byte pair)
    WritePixels {
        /// Bus to use
        #[arg(short, long, help = bus_help())]
        bus: String,

        /// Input file with raw packed pixel bytes (even length)
        #[arg(short, long)]
        input: PathBuf,
    },

    /// List available buses
    ListBuses,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_parse_hex_u16() {
        assert_eq!(parse_hex_u16("0x6000"), Ok(0x6000));
        assert_eq!(parse_hex_u16("0XFFFF"), Ok(0xFFFF));
        assert_eq!(parse_hex_u16("4096"), Ok(4096));
        assert!(parse_hex_u16("0x10000").is_err());
        assert!(parse_hex_u16("word").is_err());
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_write_words() {
        let cli = Cli::try_parse_from([
            "it8951",
            "write-words",
            "-b",
            "sim",
            "--preamble",
            "0x6000",
            "0x0302",
            "17",
        ])
        .unwrap();

        match cli.command {
            Commands::WriteWords {
                bus,
                preamble,
                words,
            } => {
                assert_eq!(bus, "sim");
                assert_eq!(preamble, 0x6000);
                assert_eq!(words, vec![0x0302, 17]);
            }
            _ => panic!("wrong subcommand"),
        }
    }

    #[test]
    fn test_global_ready_bound() {
        let cli = Cli::try_parse_from([
            "it8951",
            "read-words",
            "-b",
            "sim",
            "--max-ready-polls",
            "1000",
        ])
        .unwrap();
        assert_eq!(cli.max_ready_polls, Some(1000));
    }
}
