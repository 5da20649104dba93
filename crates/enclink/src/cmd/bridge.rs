use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use enclink_bridge::{
    Bridge, BridgeConfig, BridgeError, Endpoint, Ingestor, Interrupter, ReadMode,
};
use enclink_transport::SerialStream;
use tracing::{debug, info, warn};

use crate::cmd::BridgeArgs;
use crate::exit::{
    bridge_error, io_error, transport_error, CliError, CliResult, INTERNAL, INTERRUPTED, SUCCESS,
};
use crate::output::OutputFormat;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub fn run(args: BridgeArgs, _format: OutputFormat) -> CliResult<i32> {
    let reader = args.device.open()?;
    let writer = reader
        .try_clone()
        .map_err(|err| transport_error("clone failed", err))?;

    let config = BridgeConfig {
        staging_capacity: args.staging_capacity,
        queue_capacity: args.queue_capacity,
        read_mode: if args.nonblocking {
            ReadMode::NonBlocking
        } else {
            ReadMode::Blocking
        },
        read_timeout: None,
    };
    let (ingestor, endpoint) = Bridge::new(writer, config).split();
    let endpoint = Arc::new(endpoint);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(Arc::clone(&running), endpoint.interrupter())?;

    let pump = spawn_pump(ingestor, reader, Arc::clone(&running), endpoint.interrupter())?;
    if args.forward_stdin {
        spawn_stdin_forwarder(Arc::clone(&endpoint))?;
    }

    let mut stdout = io::stdout().lock();
    forward_to(&*endpoint, &mut stdout, || {
        !running.load(Ordering::SeqCst) || pump.is_finished()
    })?;

    if !running.load(Ordering::SeqCst) {
        info!("interrupted, shutting down");
        return Ok(INTERRUPTED);
    }

    match pump.join() {
        Ok(Ok(total)) => {
            info!(total, "serial stream ended");
            Ok(SUCCESS)
        }
        Ok(Err(err)) => Err(bridge_error("serial read failed", err)),
        Err(_) => Err(CliError::new(INTERNAL, "ingestion thread panicked")),
    }
}

/// Copy delivered bytes to `out` until the endpoint is interrupted, or until
/// a non-blocking read finds the queue empty and `stopped` reports true.
///
/// `stopped` is checked after an empty read, so bytes queued in between are
/// drained before returning.
fn forward_to<W: Write, O: Write>(
    endpoint: &Endpoint<W>,
    out: &mut O,
    mut stopped: impl FnMut() -> bool,
) -> CliResult<()> {
    let mut buf = [0u8; 256];
    loop {
        match endpoint.read(&mut buf) {
            Ok(n) => write_out(out, &buf[..n])?,
            Err(BridgeError::WouldBlock) => {
                if stopped() {
                    return drain(endpoint, out);
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(BridgeError::Interrupted) => return Ok(()),
            Err(err) => return Err(bridge_error("read failed", err)),
        }
    }
}

fn drain<W: Write, O: Write>(endpoint: &Endpoint<W>, out: &mut O) -> CliResult<()> {
    let mut buf = [0u8; 256];
    loop {
        match endpoint.read_with(&mut buf, ReadMode::NonBlocking) {
            Ok(n) => write_out(out, &buf[..n])?,
            Err(BridgeError::WouldBlock) => return Ok(()),
            Err(err) => return Err(bridge_error("read failed", err)),
        }
    }
}

fn write_out<O: Write>(out: &mut O, data: &[u8]) -> CliResult<()> {
    out.write_all(data)
        .and_then(|()| out.flush())
        .map_err(|err| io_error("stdout write failed", err))
}

fn spawn_pump(
    mut ingestor: Ingestor,
    mut reader: SerialStream,
    running: Arc<AtomicBool>,
    interrupter: Interrupter,
) -> CliResult<thread::JoinHandle<enclink_bridge::Result<u64>>> {
    thread::Builder::new()
        .name("enclink-ingest".to_string())
        .spawn(move || {
            let result = ingestor.pump(&mut reader, &running);
            let stats = ingestor.stats();
            debug!(
                frames = stats.frames,
                resync_bytes = stats.resync_bytes,
                overflow_resets = stats.overflow_resets,
                "ingestion stopped"
            );
            interrupter.interrupt();
            result
        })
        .map_err(|err| io_error("failed to start ingestion thread", err))
}

fn spawn_stdin_forwarder(endpoint: Arc<Endpoint<SerialStream>>) -> CliResult<()> {
    thread::Builder::new()
        .name("enclink-stdin".to_string())
        .spawn(move || {
            let mut sink: &Endpoint<SerialStream> = &endpoint;
            match io::copy(&mut io::stdin().lock(), &mut sink) {
                Ok(total) => debug!(total, "stdin closed"),
                Err(err) => warn!(error = %err, "stdin forwarding stopped"),
            }
        })
        .map(drop)
        .map_err(|err| io_error("failed to start stdin thread", err))
}

fn install_ctrlc_handler(running: Arc<AtomicBool>, interrupter: Interrupter) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
        interrupter.interrupt();
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
