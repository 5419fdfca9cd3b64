//! Bus backend registration and dispatch
//!
//! This module provides a registry of the host bus backends compiled into
//! the binary and opens them from a bus string such as
//! `linux:dev=/dev/spidev0.0,hrdy=24`.

use it8951_core::bus::HostBus;
use thiserror::Error;

/// Information about a bus backend
pub struct BusInfo {
    /// Primary name (used for matching)
    pub name: &'static str,
    /// Alternative names/aliases
    pub aliases: &'static [&'static str],
    /// Short description
    pub description: &'static str,
}

/// Errors from parsing or resolving a bus string
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BusSpecError {
    /// An option was not of the form key=value
    #[error("Invalid parameter format: '{0}' (expected key=value)")]
    InvalidParameter(String),

    /// The same option was given twice
    #[error("Duplicate parameter: '{0}'")]
    DuplicateParameter(String),

    /// No backend with that name is compiled in
    #[error("Unknown bus: {0}")]
    UnknownBus(String),
}

/// Get information about all available bus backends (enabled at compile time)
#[allow(unused_mut, clippy::vec_init_then_push)]
pub fn available_buses() -> Vec<BusInfo> {
    let mut buses = Vec::new();

    #[cfg(feature = "sim")]
    buses.push(BusInfo {
        name: "sim",
        aliases: &["dummy"],
        description: "In-memory simulated controller (mode=loopback|scripted)",
    });

    #[cfg(feature = "linux")]
    buses.push(BusInfo {
        name: "linux",
        aliases: &["spidev"],
        description: "Linux spidev + gpiochip (dev=,gpiochip=,cs=,hrdy=,reset=,spispeed=,divider=)",
    });

    buses
}

/// Generate a short list of bus names for CLI help
pub fn bus_names_short() -> String {
    let buses = available_buses();
    let names: Vec<&str> = buses.iter().map(|b| b.name).collect();
    names.join(", ")
}

/// Parsed bus parameters
#[derive(Debug)]
pub struct BusParams {
    /// Bus name as given
    pub name: String,
    /// Key-value parameters, in the order given
    pub params: Vec<(String, String)>,
}

impl BusParams {
    /// Borrow the parameters as (&str, &str) pairs for backend parsers
    pub fn as_pairs(&self) -> Vec<(&str, &str)> {
        self.params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect()
    }
}

/// Parse a bus string into name and parameters
///
/// Format: "name" or "name:key1=value1,key2=value2"
pub fn parse_bus_params(s: &str) -> Result<BusParams, BusSpecError> {
    let (name, opts_str) = s.split_once(':').unwrap_or((s, ""));

    let mut params: Vec<(String, String)> = Vec::new();
    if !opts_str.is_empty() {
        for opt in opts_str.split(',') {
            let Some((key, value)) = opt.split_once('=') else {
                return Err(BusSpecError::InvalidParameter(opt.to_string()));
            };
            if params.iter().any(|(k, _)| k == key) {
                return Err(BusSpecError::DuplicateParameter(key.to_string()));
            }
            params.push((key.to_string(), value.to_string()));
        }
    }

    Ok(BusParams {
        name: name.to_string(),
        params,
    })
}

/// Resolve a bus name or alias to its primary name
#[allow(unused_variables)]
pub fn find_bus(name: &str) -> Option<&'static str> {
    #[cfg(feature = "sim")]
    if name == "sim" || name == "dummy" {
        return Some("sim");
    }

    #[cfg(feature = "linux")]
    if name == "linux" || name == "spidev" {
        return Some("linux");
    }

    None
}

/// Open a host bus from a bus string
///
/// Performs the backend's bring-up; any failure is returned before the bus
/// is used.
pub fn open_bus(bus: &str) -> Result<Box<dyn HostBus>, Box<dyn std::error::Error>> {
    let params = parse_bus_params(bus)?;
    let name = find_bus(&params.name)
        .ok_or_else(|| BusSpecError::UnknownBus(params.name.clone()))?;

    log::debug!(
        "Opening bus '{}' with {} option(s)",
        name,
        params.params.len()
    );

    match name {
        #[cfg(feature = "sim")]
        "sim" => open_sim(&params),

        #[cfg(feature = "linux")]
        "linux" => it8951_linux::open_linux_host(&params.as_pairs()),

        _ => Err(BusSpecError::UnknownBus(params.name).into()),
    }
}

#[cfg(feature = "sim")]
fn open_sim(params: &BusParams) -> Result<Box<dyn HostBus>, Box<dyn std::error::Error>> {
    use it8951_sim::SimBus;

    let mut bus = SimBus::loopback();
    for (key, value) in params.as_pairs() {
        match (key, value) {
            ("mode", "loopback") => bus = SimBus::loopback(),
            ("mode", "scripted") => bus = SimBus::scripted(),
            ("mode", other) => return Err(format!("Invalid sim mode: {}", other).into()),
            _ => log::warn!("sim: Unknown option: {}={}", key, value),
        }
    }
    log::info!("Using simulated bus ({:?})", bus.mode());
    Ok(Box::new(bus))
}
