use super::{HotKeyError, HotKeyEvent, KeyDown, KeyEventMonitor, Modifiers, keys};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{disable_raw_mode, enable_raw_mode};
use flume::Sender;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Watches key presses on the controlling terminal.
///
/// Puts the terminal in raw mode while running, so Ctrl+C no longer raises
/// SIGINT; it sets the shared `shutdown` flag instead.
pub struct TerminalKeyMonitor {
    shutdown: Arc<AtomicBool>,
    running: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl TerminalKeyMonitor {
    pub fn new(shutdown: Arc<AtomicBool>) -> Self {
        Self {
            shutdown,
            running: Arc::new(AtomicBool::new(false)),
            worker: None,
        }
    }
}

impl KeyEventMonitor for TerminalKeyMonitor {
    fn name(&self) -> &'static str {
        "terminal"
    }

    fn start(&mut self, events: Sender<HotKeyEvent>) -> Result<(), HotKeyError> {
        if self.worker.is_some() {
            return Ok(());
        }

        enable_raw_mode().map_err(|e| HotKeyError::Monitor(e.to_string()))?;
        self.running.store(true, Ordering::SeqCst);

        let running = self.running.clone();
        let shutdown = self.shutdown.clone();
        let worker = thread::Builder::new()
            .name("prompty-keys".into())
            .spawn(move || watch_terminal(running, shutdown, events));

        match worker {
            Ok(handle) => {
                self.worker = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                let _ = disable_raw_mode();
                Err(HotKeyError::Monitor(e.to_string()))
            }
        }
    }

    fn stop(&mut self) {
        let Some(worker) = self.worker.take() else {
            return;
        };

        self.running.store(false, Ordering::SeqCst);
        if worker.join().is_err() {
            warn!("terminal key monitor panicked");
        }
        if let Err(e) = disable_raw_mode() {
            warn!(error = %e, "failed to restore terminal mode");
        }
        debug!("terminal key monitor stopped");
    }
}

impl Drop for TerminalKeyMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_terminal(running: Arc<AtomicBool>, shutdown: Arc<AtomicBool>, events: Sender<HotKeyEvent>) {
    while running.load(Ordering::SeqCst) {
        match event::poll(POLL_INTERVAL) {
            Ok(true) => {}
            Ok(false) => continue,
            Err(e) => {
                warn!(error = %e, "terminal poll failed");
                break;
            }
        }

        let key = match event::read() {
            Ok(Event::Key(key)) if key.kind == KeyEventKind::Press => key,
            Ok(_) => continue,
            Err(e) => {
                warn!(error = %e, "terminal read failed");
                break;
            }
        };

        if is_interrupt(&key) {
            shutdown.store(true, Ordering::SeqCst);
            continue;
        }

        if let Some(down) = key_down_from(&key, Instant::now()) {
            if events.send(HotKeyEvent::KeyDown(down)).is_err() {
                break;
            }
        }
    }
}

fn is_interrupt(key: &KeyEvent) -> bool {
    matches!(key.code, KeyCode::Char('c') | KeyCode::Char('C'))
        && key.modifiers.contains(KeyModifiers::CONTROL)
}

/// Translates a terminal key event into the app's key code and modifiers.
/// Keys outside the bindable set yield `None`.
pub fn key_down_from(key: &KeyEvent, timestamp: Instant) -> Option<KeyDown> {
    let label = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_ascii_uppercase().to_string(),
        KeyCode::Enter => "Return".into(),
        KeyCode::Tab => "Tab".into(),
        KeyCode::Esc => "Escape".into(),
        KeyCode::Backspace => "Delete".into(),
        KeyCode::Left => "Left".into(),
        KeyCode::Right => "Right".into(),
        KeyCode::Up => "Up".into(),
        KeyCode::Down => "Down".into(),
        _ => return None,
    };
    let key_code = keys::code_for_label(&label)?;

    let mut modifiers = Modifiers::NONE;
    if key
        .modifiers
        .intersects(KeyModifiers::SUPER | KeyModifiers::META)
    {
        modifiers |= Modifiers::COMMAND;
    }
    if key.modifiers.contains(KeyModifiers::ALT) {
        modifiers |= Modifiers::OPTION;
    }
    if key.modifiers.contains(KeyModifiers::SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        modifiers |= Modifiers::CONTROL;
    }

    Some(KeyDown {
        key_code,
        modifiers,
        timestamp,
    })
}
