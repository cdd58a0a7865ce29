//! Terminal key control: Space pauses, Esc or Ctrl+C stops.
//!
//! Without raw mode only Ctrl+C works, through a SIGINT handler.

use std::thread::JoinHandle;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};

use super::CollectError;
use super::session::SessionControls;

const KEY_POLL: Duration = Duration::from_millis(100);

/// What a key press does to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    TogglePause,
    Stop,
}

/// Map a key event to a session action.
pub fn action_for(key: &KeyEvent) -> Option<KeyAction> {
    if key.kind == KeyEventKind::Release {
        return None;
    }
    match key.code {
        KeyCode::Char(' ') => Some(KeyAction::TogglePause),
        KeyCode::Esc => Some(KeyAction::Stop),
        KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Some(KeyAction::Stop)
        }
        _ => None,
    }
}

/// Raw-mode key reader on a background thread.
///
/// Dropping the listener stops the thread and restores the terminal.
pub struct KeyListener {
    controls: SessionControls,
    handle: Option<JoinHandle<()>>,
}

impl KeyListener {
    /// Enter raw mode and start listening. `None` when the terminal refuses raw mode.
    pub fn spawn(controls: SessionControls) -> Option<Self> {
        if let Err(err) = enable_raw_mode() {
            tracing::warn!("Key control unavailable: {err}");
            return None;
        }
        let thread_controls = controls.clone();
        let handle = std::thread::spawn(move || listen(&thread_controls));
        Some(Self {
            controls,
            handle: Some(handle),
        })
    }
}

impl Drop for KeyListener {
    fn drop(&mut self) {
        self.controls.stop();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        let _ = disable_raw_mode();
    }
}

/// Stop the session on SIGINT instead of letting the process die, so the summary still prints.
///
/// For terminals without raw mode. Only one handler can be installed per process.
pub fn stop_on_interrupt(controls: &SessionControls) -> Result<(), CollectError> {
    ctrlc::set_handler(interrupt_handler(controls.clone()))?;
    Ok(())
}

fn interrupt_handler(controls: SessionControls) -> impl FnMut() + Send + 'static {
    move || {
        if controls.is_running() {
            println!("\nStopping collection...");
            controls.stop();
        }
    }
}

fn listen(controls: &SessionControls) {
    while controls.is_running() {
        match event::poll(KEY_POLL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(err) => {
                tracing::warn!("Key polling failed: {err}");
                return;
            }
        }
        let Ok(Event::Key(key)) = event::read() else {
            continue;
        };
        match action_for(&key) {
            Some(KeyAction::TogglePause) => {
                if controls.toggle_pause() {
                    print!("\r\nPaused. Press SPACE to resume.\r\n");
                } else {
                    print!("\r\nResuming collection...\r\n");
                }
            }
            Some(KeyAction::Stop) => {
                print!("\r\nStopping collection...\r\n");
                controls.stop();
            }
            None => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_session_keys() {
        let space = KeyEvent::new(KeyCode::Char(' '), KeyModifiers::NONE);
        let esc = KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE);
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);
        assert_eq!(action_for(&space), Some(KeyAction::TogglePause));
        assert_eq!(action_for(&esc), Some(KeyAction::Stop));
        assert_eq!(action_for(&ctrl_c), Some(KeyAction::Stop));
        assert_eq!(action_for(&plain_c), None);
    }

    #[test]
    fn interrupt_stops_the_session_once() {
        let controls = SessionControls::new();
        let mut handler = interrupt_handler(controls.clone());
        handler();
        assert!(!controls.is_running());
        handler();
        assert!(!controls.is_running());
    }
}
