use super::{
    GlobalHotKeyBackend, HotKey, HotKeyBackend, HotKeyEvent, KeyDown, KeyEventMonitor,
    TerminalKeyMonitor,
};
use flume::{Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Fallback presses closer than this to the last accepted one are dropped.
/// Both monitors can see the same physical press.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(50);

/// Longest stretch `wait` blocks on the channel between two passes of the
/// platform event loop.
const PUMP_INTERVAL: Duration = Duration::from_millis(20);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RegistrationMode {
    Idle,
    Primary,
    Fallback,
}

#[derive(Debug)]
enum Registration {
    Idle,
    Primary {
        hot_key: HotKey,
        id: u32,
    },
    Fallback {
        hot_key: HotKey,
        last_trigger: Option<Instant>,
    },
}

/// Owns the single active hotkey binding and dispatches its presses.
///
/// Not `Send`: it lives on the control thread, and everything the OS or the
/// monitors report reaches it through the internal channel.
pub struct HotKeyManager {
    backend: Box<dyn HotKeyBackend>,
    monitors: Vec<Box<dyn KeyEventMonitor>>,
    registration: Registration,
    sender: Sender<HotKeyEvent>,
    receiver: Receiver<HotKeyEvent>,
    on_hot_key: Option<Box<dyn FnMut()>>,
}

impl HotKeyManager {
    pub fn new(backend: Box<dyn HotKeyBackend>, monitors: Vec<Box<dyn KeyEventMonitor>>) -> Self {
        let (sender, receiver) = flume::unbounded();
        Self {
            backend,
            monitors,
            registration: Registration::Idle,
            sender,
            receiver,
            on_hot_key: None,
        }
    }

    /// OS registration through `global-hotkey`, with the terminal as the
    /// fallback observer. Ctrl+C seen by the terminal sets `shutdown`.
    pub fn system(shutdown: Arc<AtomicBool>) -> Self {
        Self::new(
            Box::new(GlobalHotKeyBackend::new()),
            vec![Box::new(TerminalKeyMonitor::new(shutdown))],
        )
    }

    pub fn set_handler(&mut self, handler: impl FnMut() + 'static) {
        self.on_hot_key = Some(Box::new(handler));
    }

    pub fn mode(&self) -> RegistrationMode {
        match self.registration {
            Registration::Idle => RegistrationMode::Idle,
            Registration::Primary { .. } => RegistrationMode::Primary,
            Registration::Fallback { .. } => RegistrationMode::Fallback,
        }
    }

    pub fn hot_key(&self) -> Option<HotKey> {
        match self.registration {
            Registration::Idle => None,
            Registration::Primary { hot_key, .. } | Registration::Fallback { hot_key, .. } => {
                Some(hot_key)
            }
        }
    }

    /// Replaces any previous binding with `hot_key`.
    ///
    /// Tries OS registration first; on failure starts the monitors. Stays
    /// idle only if neither path could be set up.
    pub fn register(&mut self, hot_key: HotKey) -> RegistrationMode {
        self.unregister();

        match self.backend.register(hot_key, self.sender.clone()) {
            Ok(id) => {
                info!(%hot_key, id, "registered global hotkey");
                self.registration = Registration::Primary { hot_key, id };
                return self.mode();
            }
            Err(e) => {
                warn!(%hot_key, error = %e, "hotkey registration failed, falling back to key monitors");
            }
        }

        let mut started = 0;
        for monitor in &mut self.monitors {
            match monitor.start(self.sender.clone()) {
                Ok(()) => {
                    debug!(monitor = monitor.name(), "key monitor started");
                    started += 1;
                }
                Err(e) => warn!(monitor = monitor.name(), error = %e, "key monitor failed to start"),
            }
        }

        if started == 0 {
            error!(%hot_key, "no hotkey path available");
            return self.mode();
        }

        self.registration = Registration::Fallback {
            hot_key,
            last_trigger: None,
        };
        self.mode()
    }

    /// Tears down both paths and drops queued events. Safe when idle.
    pub fn unregister(&mut self) {
        match std::mem::replace(&mut self.registration, Registration::Idle) {
            Registration::Idle => {}
            Registration::Primary { hot_key, id } => {
                if let Err(e) = self.backend.unregister(id) {
                    warn!(%hot_key, error = %e, "failed to unregister hotkey");
                }
            }
            Registration::Fallback { .. } => {
                for monitor in &mut self.monitors {
                    monitor.stop();
                }
            }
        }

        let stale = self.receiver.drain().count();
        if stale > 0 {
            debug!(stale, "dropped queued hotkey events");
        }
    }

    /// Pumps the platform event loop once, then runs the callback for every
    /// queued event that counts as a press. Never blocks. Returns how many
    /// times the callback ran.
    pub fn dispatch_pending(&mut self) -> usize {
        self.backend.pump();
        let mut fired = 0;
        while let Ok(event) = self.receiver.try_recv() {
            if self.handle(event) {
                fired += 1;
            }
        }
        fired
    }

    /// Blocks up to `timeout` for the next event, then drains the queue.
    ///
    /// OS hotkey presses only arrive while the platform loop runs on this
    /// thread, so the loop is pumped every [`PUMP_INTERVAL`] meanwhile.
    pub fn wait(&mut self, timeout: Duration) -> usize {
        let deadline = Instant::now() + timeout;
        loop {
            let fired = self.dispatch_pending();
            if fired > 0 {
                return fired;
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return 0;
            }
            match self.receiver.recv_timeout(remaining.min(PUMP_INTERVAL)) {
                Ok(event) => return usize::from(self.handle(event)) + self.dispatch_pending(),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return 0,
            }
        }
    }

    fn handle(&mut self, event: HotKeyEvent) -> bool {
        let accepted = match (&mut self.registration, event) {
            (Registration::Primary { id, .. }, HotKeyEvent::Triggered { id: fired }) => {
                *id == fired
            }
            (
                Registration::Fallback {
                    hot_key,
                    last_trigger,
                },
                HotKeyEvent::KeyDown(down),
            ) => accept_key_down(*hot_key, last_trigger, down),
            _ => false,
        };

        if accepted {
            if let Some(handler) = self.on_hot_key.as_mut() {
                handler();
            }
        }
        accepted
    }
}

impl Drop for HotKeyManager {
    fn drop(&mut self) {
        self.unregister();
    }
}

fn accept_key_down(target: HotKey, last_trigger: &mut Option<Instant>, down: KeyDown) -> bool {
    if down.key_code != target.key_code || down.modifiers != target.modifiers {
        return false;
    }

    if let Some(last) = *last_trigger {
        let gap = if down.timestamp >= last {
            down.timestamp - last
        } else {
            last - down.timestamp
        };
        if gap < DEBOUNCE_WINDOW {
            return false;
        }
    }

    *last_trigger = Some(down.timestamp);
    true
}
