use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};
use std::thread::{self, JoinHandle};

use crate::sensor::{
    LineEvent, LineLayout, LineReader, Reading, SerialError, SerialSettings, open_port, parse_line,
};

/// Events sent from the reader thread to the UI.
#[derive(Debug, Clone, PartialEq)]
pub enum PollerMessage {
    Connected,
    Reading(Reading),
    /// The port could not be opened or a read failed; the thread has exited.
    Failed(String),
    /// The device closed the stream.
    Closed,
}

/// Background serial reader. Dropping it stops and joins the thread.
pub struct Poller {
    running: Arc<AtomicBool>,
    receiver: Receiver<PollerMessage>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    /// Open `settings.port` on a worker thread and stream parsed readings.
    pub fn spawn(settings: SerialSettings, layout: LineLayout) -> Self {
        Self::spawn_with(move || open_port(&settings), layout)
    }

    /// Run the reader loop over whatever `open` returns.
    pub fn spawn_with<R, F>(open: F, layout: LineLayout) -> Self
    where
        R: Read,
        F: FnOnce() -> Result<R, SerialError> + Send + 'static,
    {
        let running = Arc::new(AtomicBool::new(true));
        let (sender, receiver) = mpsc::channel();
        let flag = Arc::clone(&running);
        let handle = thread::spawn(move || {
            let source = match open() {
                Ok(source) => source,
                Err(err) => {
                    tracing::warn!("Dashboard connection failed: {err}");
                    let _ = sender.send(PollerMessage::Failed(err.to_string()));
                    return;
                }
            };
            let _ = sender.send(PollerMessage::Connected);
            read_loop(LineReader::new(source), layout, &flag, &sender);
        });
        Self {
            running,
            receiver,
            handle: Some(handle),
        }
    }

    /// Messages received since the last call, in arrival order.
    pub fn drain(&self) -> Vec<PollerMessage> {
        let mut messages = Vec::new();
        loop {
            match self.receiver.try_recv() {
                Ok(message) => messages.push(message),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        messages
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn read_loop<R: Read>(
    mut lines: LineReader<R>,
    layout: LineLayout,
    running: &AtomicBool,
    sender: &Sender<PollerMessage>,
) {
    let mut skipped = 0u64;
    while running.load(Ordering::SeqCst) {
        let message = match lines.next_event() {
            Ok(LineEvent::Line(line)) => match parse_line(&line, layout) {
                Some(reading) => PollerMessage::Reading(reading),
                None => {
                    skipped += 1;
                    tracing::trace!("Skipped dashboard line: {line}");
                    continue;
                }
            },
            Ok(LineEvent::Idle) => continue,
            Ok(LineEvent::Undecodable) => {
                skipped += 1;
                continue;
            }
            Ok(LineEvent::Closed) => {
                let _ = sender.send(PollerMessage::Closed);
                break;
            }
            Err(err) => {
                tracing::warn!("Dashboard read failed: {err}");
                let _ = sender.send(PollerMessage::Failed(err.to_string()));
                break;
            }
        };
        if sender.send(message).is_err() {
            break;
        }
    }
    tracing::debug!("Dashboard reader stopped; {skipped} lines skipped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};
    use std::time::{Duration, Instant};

    fn collect_until_done(poller: &Poller) -> Vec<PollerMessage> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut messages = Vec::new();
        while !poller.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        messages.extend(poller.drain());
        messages
    }

    #[test]
    fn streams_indexed_readings_and_skips_noise() {
        let input = b"booting\n1,24.5,51.0,1,2,3,4,5,6,7,8,9,10\n24.5,51.0,1,2\n2,25.0,50.0,1,2,3,4,5,6,7,8,9,10\n".to_vec();
        let poller = Poller::spawn_with(move || Ok(Cursor::new(input)), LineLayout::Indexed);
        let messages = collect_until_done(&poller);
        assert_eq!(messages.first(), Some(&PollerMessage::Connected));
        let readings: Vec<f64> = messages
            .iter()
            .filter_map(|m| match m {
                PollerMessage::Reading(r) => Some(r.temperature),
                _ => None,
            })
            .collect();
        assert_eq!(readings, vec![24.5, 25.0]);
        assert_eq!(messages.last(), Some(&PollerMessage::Closed));
    }

    #[test]
    fn open_failure_is_reported() {
        let poller = Poller::spawn_with(
            || -> Result<Cursor<Vec<u8>>, SerialError> {
                Err(SerialError::Read(io::Error::new(io::ErrorKind::NotFound, "no device")))
            },
            LineLayout::Plain,
        );
        let messages = collect_until_done(&poller);
        assert_eq!(messages.len(), 1);
        assert!(matches!(&messages[0], PollerMessage::Failed(msg) if msg.contains("no device")));
    }
}
