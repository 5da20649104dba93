use std::fs::{File, OpenOptions};
use std::os::fd::AsRawFd;
use std::os::unix::fs::OpenOptionsExt;
use std::path::Path;

use tracing::{debug, info};

use crate::error::{Result, TransportError};
use crate::traits::SerialStream;

/// Line speed used when none is configured.
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Line settings applied once when the device is opened.
#[derive(Debug, Clone)]
pub struct SerialConfig {
    /// UART line speed in bits per second. Default: 9600.
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            baud_rate: DEFAULT_BAUD_RATE,
        }
    }
}

/// Serial character device (tty) transport.
pub struct SerialDevice;

impl SerialDevice {
    /// Open a tty with the default line settings.
    pub fn open(path: impl AsRef<Path>) -> Result<SerialStream> {
        Self::open_with_config(path, &SerialConfig::default())
    }

    /// Open a tty in raw mode and apply `config.baud_rate`.
    ///
    /// The rate is validated before the device is touched.
    pub fn open_with_config(path: impl AsRef<Path>, config: &SerialConfig) -> Result<SerialStream> {
        let path = path.as_ref();
        let speed = speed_for(config.baud_rate)
            .ok_or(TransportError::UnsupportedBaudRate(config.baud_rate))?;

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(libc::O_NOCTTY)
            .open(path)
            .map_err(|e| TransportError::Open {
                path: path.to_path_buf(),
                source: e,
            })?;

        configure_raw(&file, speed).map_err(|e| TransportError::Configure {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(?path, baud_rate = config.baud_rate, "opened serial device");
        Ok(SerialStream::from_file(file))
    }
}

/// Map a numeric line speed onto its termios constant.
pub fn speed_for(baud_rate: u32) -> Option<libc::speed_t> {
    let speed = match baud_rate {
        1200 => libc::B1200,
        2400 => libc::B2400,
        4800 => libc::B4800,
        9600 => libc::B9600,
        19200 => libc::B19200,
        38400 => libc::B38400,
        57600 => libc::B57600,
        115200 => libc::B115200,
        230400 => libc::B230400,
        _ => return None,
    };
    Some(speed)
}

fn configure_raw(file: &File, speed: libc::speed_t) -> std::io::Result<()> {
    let fd = file.as_raw_fd();
    let mut tio = std::mem::MaybeUninit::<libc::termios>::uninit();

    // SAFETY: `fd` is an open descriptor owned by `file` and `tio` points to
    // writable storage of the right size for tcgetattr to fill.
    if unsafe { libc::tcgetattr(fd, tio.as_mut_ptr()) } != 0 {
        return Err(std::io::Error::last_os_error());
    }
    // SAFETY: tcgetattr succeeded, so every field has been initialized.
    let mut tio = unsafe { tio.assume_init() };

    // SAFETY: `tio` is a valid, initialized termios structure.
    unsafe {
        libc::cfmakeraw(&mut tio);
        if libc::cfsetispeed(&mut tio, speed) != 0 || libc::cfsetospeed(&mut tio, speed) != 0 {
            return Err(std::io::Error::last_os_error());
        }
    }

    // SAFETY: `fd` is still open and `tio` is a valid termios structure.
    if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &tio) } != 0 {
        return Err(std::io::Error::last_os_error());
    }

    debug!(fd, "applied raw line discipline");
    Ok(())
}
