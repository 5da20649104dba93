use std::fs::File;
use std::io::{self, ErrorKind, Read};

use enclink_frame::{FrameDecoder, FrameError};
use tracing::debug;

use crate::cmd::DecodeArgs;
use crate::exit::{frame_error, io_error, CliResult, SUCCESS};
use crate::output::{print_frame, print_stats, OutputFormat};

const READ_CHUNK_SIZE: usize = 256;

pub fn run(args: DecodeArgs, format: OutputFormat) -> CliResult<i32> {
    let mut input: Box<dyn Read> = match &args.input {
        Some(path) => Box::new(
            File::open(path)
                .map_err(|err| io_error(&format!("failed opening {}", path.display()), err))?,
        ),
        None => Box::new(io::stdin().lock()),
    };

    let mut decoder = FrameDecoder::with_capacity(args.staging_capacity);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let read = match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(io_error("read failed", err)),
        };
        total += read as u64;

        match decoder.feed(&chunk[..read]) {
            Ok(frames) => {
                for frame in frames {
                    print_frame(&frame, format);
                }
            }
            // Logged by the decoder; the rest of the capture still decodes.
            Err(FrameError::Overflow { .. }) => {}
            Err(err) => return Err(frame_error("decode failed", err)),
        }
    }

    debug!(total, pending = decoder.pending(), "capture exhausted");
    print_stats(decoder.stats(), decoder.pending(), format);
    Ok(SUCCESS)
}
