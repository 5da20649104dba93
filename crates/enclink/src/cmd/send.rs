use std::fs;

use bytes::BytesMut;
use enclink_bridge::Transmitter;
use enclink_frame::encode_frame;
use tracing::warn;

use crate::cmd::SendArgs;
use crate::exit::{
    bridge_error, frame_error, io_error, CliError, CliResult, FAILURE, SUCCESS, USAGE,
};
use crate::output::{print_send, OutputFormat};

pub fn run(args: SendArgs, format: OutputFormat) -> CliResult<i32> {
    let payload = resolve_payload(&args)?;
    let wire = match args.frame_type {
        Some(frame_type) if !args.raw => {
            let mut dst = BytesMut::new();
            encode_frame(frame_type, &payload, &mut dst)
                .map_err(|err| frame_error("encode failed", err))?;
            dst.to_vec()
        }
        _ => payload,
    };

    let mut transmitter = Transmitter::new(args.device.open()?);
    let written = transmitter
        .transmit(&wire)
        .map_err(|err| bridge_error("send failed", err))?;

    let frame_type = args.frame_type.filter(|_| !args.raw);
    print_send(frame_type, wire.len(), written, format);

    if written < wire.len() {
        warn!(requested = wire.len(), written, "device accepted a partial write");
        return Ok(FAILURE);
    }
    Ok(SUCCESS)
}

fn resolve_payload(args: &SendArgs) -> CliResult<Vec<u8>> {
    if let Some(data) = &args.data {
        return Ok(data.as_bytes().to_vec());
    }
    if let Some(hex) = &args.hex {
        return decode_hex(hex);
    }
    if let Some(path) = &args.file {
        return fs::read(path)
            .map_err(|err| io_error(&format!("failed reading {}", path.display()), err));
    }
    Ok(Vec::new())
}

fn decode_hex(input: &str) -> CliResult<Vec<u8>> {
    let digits: Vec<u8> = input
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        return Err(CliError::new(USAGE, "--hex needs an even number of digits"));
    }

    digits
        .chunks(2)
        .map(|pair| {
            let text = std::str::from_utf8(pair).unwrap_or("");
            u8::from_str_radix(text, 16)
                .map_err(|_| CliError::new(USAGE, format!("--hex has invalid digits {text:?}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_payloads_decode() {
        assert_eq!(decode_hex("aabbcc").unwrap(), vec![0xAA, 0xBB, 0xCC]);
        assert_eq!(decode_hex("0D F0:AD 0b").unwrap(), vec![0x0D, 0xF0, 0xAD, 0x0B]);
        assert!(decode_hex("").unwrap().is_empty());
    }

    #[test]
    fn bad_hex_is_a_usage_error() {
        assert_eq!(decode_hex("abc").unwrap_err().code, USAGE);
        assert_eq!(decode_hex("zz").unwrap_err().code, USAGE);
    }
}
