//! Serial port access and line framing.

use std::io::{self, BufRead, BufReader, Read};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default device baud rate.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Errors raised while talking to the serial device.
#[derive(Debug, Error)]
pub enum SerialError {
    /// The port could not be opened.
    #[error("Failed to open serial port {port}: {source}")]
    Open {
        port: String,
        source: serialport::Error,
    },
    /// Port enumeration failed.
    #[error("Failed to list serial ports: {0}")]
    List(serialport::Error),
    /// A read failed for a reason other than a timeout.
    #[error("Serial read failed: {0}")]
    Read(io::Error),
}

/// Connection parameters for a serial device.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    pub port: String,
    pub baud_rate: u32,
    pub timeout_ms: u64,
}

impl Default for SerialSettings {
    fn default() -> Self {
        Self {
            port: default_port_name().to_string(),
            baud_rate: DEFAULT_BAUD_RATE,
            timeout_ms: 2_000,
        }
    }
}

fn default_port_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "COM4"
    } else {
        "/dev/ttyUSB0"
    }
}

/// Serial port visible to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortInfo {
    pub name: String,
    pub description: String,
}

/// Enumerate serial ports.
pub fn available_ports() -> Result<Vec<PortInfo>, SerialError> {
    let ports = serialport::available_ports().map_err(SerialError::List)?;
    Ok(ports
        .into_iter()
        .map(|port| {
            let description = match port.port_type {
                serialport::SerialPortType::UsbPort(usb) => usb
                    .product
                    .unwrap_or_else(|| format!("USB {:04x}:{:04x}", usb.vid, usb.pid)),
                serialport::SerialPortType::BluetoothPort => "Bluetooth".to_string(),
                serialport::SerialPortType::PciPort => "PCI".to_string(),
                serialport::SerialPortType::Unknown => "Unknown".to_string(),
            };
            PortInfo {
                name: port.port_name,
                description,
            }
        })
        .collect())
}

/// Open a port with the configured baud rate and read timeout.
pub fn open_port(settings: &SerialSettings) -> Result<Box<dyn serialport::SerialPort>, SerialError> {
    serialport::new(settings.port.as_str(), settings.baud_rate)
        .timeout(Duration::from_millis(settings.timeout_ms))
        .open()
        .map_err(|source| SerialError::Open {
            port: settings.port.clone(),
            source,
        })
}

/// Outcome of one attempt to read a line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEvent {
    /// A complete line, without its terminator.
    Line(String),
    /// The read timed out before a full line arrived.
    Idle,
    /// A full line arrived but was not valid UTF-8.
    Undecodable,
    /// The underlying reader is exhausted.
    Closed,
}

/// Newline framing over any byte reader. Partial lines survive read timeouts.
pub struct LineReader<R> {
    inner: BufReader<R>,
    pending: Vec<u8>,
}

impl<R: Read> LineReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner: BufReader::new(inner),
            pending: Vec::new(),
        }
    }

    /// Read until a newline, a timeout or end of stream.
    pub fn next_event(&mut self) -> Result<LineEvent, SerialError> {
        match self.inner.read_until(b'\n', &mut self.pending) {
            Ok(0) if self.pending.is_empty() => Ok(LineEvent::Closed),
            // An unterminated tail at end of stream still counts as a line.
            Ok(_) => Ok(self.take_line()),
            Err(err) if is_idle(&err) => Ok(LineEvent::Idle),
            Err(err) => Err(SerialError::Read(err)),
        }
    }

    fn take_line(&mut self) -> LineEvent {
        let bytes = std::mem::take(&mut self.pending);
        match String::from_utf8(bytes) {
            Ok(text) => LineEvent::Line(text.trim_end_matches(['\r', '\n']).to_string()),
            Err(_) => LineEvent::Undecodable,
        }
    }
}

fn is_idle(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Reader replaying scripted chunks, with `None` standing for a timeout.
    struct Scripted {
        chunks: VecDeque<Option<Vec<u8>>>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                None => Ok(0),
                Some(None) => Err(io::Error::new(io::ErrorKind::TimedOut, "timeout")),
                Some(Some(bytes)) => {
                    let n = bytes.len().min(buf.len());
                    buf[..n].copy_from_slice(&bytes[..n]);
                    Ok(n)
                }
            }
        }
    }

    #[test]
    fn partial_line_survives_timeout() {
        let reader = Scripted {
            chunks: VecDeque::from(vec![
                Some(b"24.5,5".to_vec()),
                None,
                Some(b"1.0\r\nnext\n".to_vec()),
            ]),
        };
        let mut lines = LineReader::new(reader);
        assert_eq!(lines.next_event().unwrap(), LineEvent::Idle);
        assert_eq!(
            lines.next_event().unwrap(),
            LineEvent::Line("24.5,51.0".to_string())
        );
        assert_eq!(lines.next_event().unwrap(), LineEvent::Line("next".to_string()));
        assert_eq!(lines.next_event().unwrap(), LineEvent::Closed);
    }

    #[test]
    fn invalid_utf8_is_reported_and_skipped() {
        let mut lines = LineReader::new(io::Cursor::new(b"\xff\xfe\nok\n".to_vec()));
        assert_eq!(lines.next_event().unwrap(), LineEvent::Undecodable);
        assert_eq!(lines.next_event().unwrap(), LineEvent::Line("ok".to_string()));
    }

    #[test]
    fn unterminated_tail_is_returned() {
        let mut lines = LineReader::new(io::Cursor::new(b"tail".to_vec()));
        assert_eq!(lines.next_event().unwrap(), LineEvent::Line("tail".to_string()));
        assert_eq!(lines.next_event().unwrap(), LineEvent::Closed);
    }
}
