use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Subcommand};
use enclink_bridge::{StatusAttribute, DEFAULT_QUEUE_CAPACITY};
use enclink_frame::DEFAULT_STAGING_CAPACITY;
use enclink_transport::{SerialConfig, SerialDevice, SerialStream, DEFAULT_BAUD_RATE};

use crate::exit::{transport_error, CliError, CliResult, USAGE};
use crate::output::OutputFormat;

pub mod bridge;
pub mod decode;
pub mod send;
pub mod status;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Bridge a serial device to stdout until Ctrl-C or end of stream.
    Bridge(BridgeArgs),
    /// Wait for the first state update and print it.
    Status(StatusArgs),
    /// Send one frame (or raw bytes) to the device.
    Send(SendArgs),
    /// Decode frames from a capture file or stdin.
    Decode(DecodeArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Bridge(args) => bridge::run(args, format),
        Command::Status(args) => status::run(args, format),
        Command::Send(args) => send::run(args, format),
        Command::Decode(args) => decode::run(args, format),
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct DeviceArgs {
    /// Serial device path.
    #[arg(env = "ENCLINK_DEVICE")]
    pub device: PathBuf,
    /// Line speed in bits per second.
    #[arg(long, env = "ENCLINK_BAUD_RATE", default_value_t = DEFAULT_BAUD_RATE)]
    pub baud_rate: u32,
}

impl DeviceArgs {
    pub fn open(&self) -> CliResult<SerialStream> {
        let config = SerialConfig {
            baud_rate: self.baud_rate,
        };
        SerialDevice::open_with_config(&self.device, &config)
            .map_err(|err| transport_error("open failed", err))
    }
}

#[derive(Args, Debug)]
pub struct BridgeArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Forward stdin to the device through the transmit path.
    #[arg(long)]
    pub forward_stdin: bool,
    /// Poll the delivery queue instead of blocking on it.
    #[arg(long)]
    pub nonblocking: bool,
    /// Staging accumulator capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_STAGING_CAPACITY)]
    pub staging_capacity: usize,
    /// Delivery queue capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_QUEUE_CAPACITY)]
    pub queue_capacity: usize,
}

#[derive(Args, Debug)]
pub struct StatusArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Maximum time to wait for a state update (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub timeout: String,
    /// Print a single attribute (root_state or version) as a bare decimal line.
    #[arg(long, value_parser = parse_attribute)]
    pub attribute: Option<StatusAttribute>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    #[command(flatten)]
    pub device: DeviceArgs,
    /// Frame type code, decimal or 0x-prefixed hex.
    #[arg(long = "type", value_parser = parse_frame_type, required_unless_present = "raw")]
    pub frame_type: Option<u16>,
    /// Raw string payload.
    #[arg(long, conflicts_with_all = ["hex", "file"])]
    pub data: Option<String>,
    /// Hex-encoded payload.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub hex: Option<String>,
    /// Read payload from file.
    #[arg(long, conflicts_with_all = ["data", "hex"])]
    pub file: Option<PathBuf>,
    /// Send the payload bytes as-is, without a frame header.
    #[arg(long, conflicts_with = "frame_type")]
    pub raw: bool,
}

#[derive(Args, Debug)]
pub struct DecodeArgs {
    /// Capture file to decode. Reads stdin when omitted.
    pub input: Option<PathBuf>,
    /// Staging accumulator capacity in bytes.
    #[arg(long, default_value_t = DEFAULT_STAGING_CAPACITY)]
    pub staging_capacity: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

pub fn parse_duration(input: &str) -> CliResult<Duration> {
    let input = input.trim();
    if input.is_empty() {
        return Err(CliError::new(USAGE, "duration must not be empty"));
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| CliError::new(USAGE, format!("invalid duration value: {input}")))?;

    if value == 0 {
        return Err(CliError::new(USAGE, "duration must be greater than zero"));
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

fn parse_frame_type(input: &str) -> Result<u16, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|err| format!("invalid frame type {input:?}: {err}"))
}

fn parse_attribute(input: &str) -> Result<StatusAttribute, String> {
    StatusAttribute::from_name(input.trim()).ok_or_else(|| {
        let names: Vec<&str> = StatusAttribute::ALL.iter().map(|a| a.name()).collect();
        format!("unknown attribute {input:?} (expected one of {})", names.join(", "))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_duration_seconds_and_millis() {
        assert_eq!(parse_duration("2s").unwrap(), Duration::from_secs(2));
        assert_eq!(parse_duration("150ms").unwrap(), Duration::from_millis(150));
        assert_eq!(parse_duration("3").unwrap(), Duration::from_secs(3));
    }

    #[test]
    fn parse_duration_rejects_invalid_values() {
        assert!(parse_duration("0s").is_err());
        assert!(parse_duration("bad").is_err());
        assert_eq!(parse_duration("").unwrap_err().code, USAGE);
    }

    #[test]
    fn attribute_names_resolve() {
        assert_eq!(parse_attribute("root_state"), Ok(StatusAttribute::RootState));
        assert_eq!(parse_attribute("version"), Ok(StatusAttribute::Version));
        assert!(parse_attribute("baud_rate")
            .unwrap_err()
            .contains("root_state, version"));
    }

    #[test]
    fn frame_type_accepts_hex_and_decimal() {
        assert_eq!(parse_frame_type("0x0004"), Ok(4));
        assert_eq!(parse_frame_type("0X99"), Ok(0x99));
        assert_eq!(parse_frame_type("153"), Ok(153));
        assert!(parse_frame_type("0x10000").is_err());
        assert!(parse_frame_type("state").is_err());
    }
}
