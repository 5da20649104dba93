use std::io::Read;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Instant;

use enclink_bridge::{DeliveryQueue, Dispatched, Dispatcher, StatusView};
use enclink_frame::FrameDecoder;
use tracing::debug;

use crate::cmd::{parse_duration, StatusArgs};
use crate::exit::{io_error, CliError, CliResult, SUCCESS, TIMEOUT, TRANSPORT_ERROR};
use crate::output::{print_raw, print_status, OutputFormat};

pub fn run(args: StatusArgs, format: OutputFormat) -> CliResult<i32> {
    let timeout = parse_duration(&args.timeout)?;
    let mut serial = args.device.open()?;

    // The tty read blocks without a deadline, so it runs on its own thread
    // and the deadline is enforced on the channel.
    let (tx, rx) = mpsc::channel::<std::io::Result<Vec<u8>>>();
    thread::Builder::new()
        .name("enclink-status".to_string())
        .spawn(move || {
            let mut chunk = [0u8; 256];
            loop {
                let result = serial.read(&mut chunk).map(|n| chunk[..n].to_vec());
                let stop = !matches!(result, Ok(ref data) if !data.is_empty());
                if tx.send(result).is_err() || stop {
                    break;
                }
            }
        })
        .map_err(|err| io_error("failed to start reader thread", err))?;

    let queue = Arc::new(DeliveryQueue::default());
    let dispatcher = Dispatcher::new(Arc::clone(&queue));
    let mut decoder = FrameDecoder::new();
    let deadline = Instant::now() + timeout;

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let chunk = match rx.recv_timeout(remaining) {
            Ok(Ok(chunk)) if chunk.is_empty() => {
                return Err(CliError::new(
                    TRANSPORT_ERROR,
                    "serial stream closed before a state update arrived",
                ))
            }
            Ok(Ok(chunk)) => chunk,
            Ok(Err(err)) => return Err(io_error("serial read failed", err)),
            Err(RecvTimeoutError::Timeout) => {
                return Err(CliError::new(
                    TIMEOUT,
                    format!("no state update within {timeout:?}"),
                ))
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(CliError::new(TRANSPORT_ERROR, "serial reader stopped"))
            }
        };

        // Overflow and resync faults are logged by the decoder; keep listening.
        let Ok(frames) = decoder.feed(&chunk) else {
            continue;
        };
        for frame in frames {
            match dispatcher.dispatch(&frame) {
                Dispatched::StateUpdated(snapshot) => {
                    debug!(?snapshot, "state update received");
                    let view = StatusView::new(queue);
                    match args.attribute {
                        Some(attr) => print_raw(view.render(attr).as_bytes()),
                        None => print_status(&view, format),
                    }
                    return Ok(SUCCESS);
                }
                Dispatched::ShortStatePayload { .. } | Dispatched::Forwarded { .. } => {}
            }
        }
    }
}
