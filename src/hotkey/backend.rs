use super::{HotKey, HotKeyBackend, HotKeyError, HotKeyEvent, Modifiers, keys};
use flume::Sender;
use global_hotkey::hotkey::{Code, HotKey as OsHotKey, Modifiers as OsModifiers};
use global_hotkey::{GlobalHotKeyEvent, GlobalHotKeyManager, HotKeyState};
use tracing::debug;

/// Registers hotkeys with the OS through `global-hotkey`.
///
/// The OS manager is created on first use so that constructing the backend
/// never fails; a platform without a usable display surfaces as
/// [`HotKeyError::Unavailable`] from `register`.
#[derive(Default)]
pub struct GlobalHotKeyBackend {
    manager: Option<GlobalHotKeyManager>,
    registered: Option<OsHotKey>,
}

impl GlobalHotKeyBackend {
    pub fn new() -> Self {
        Self::default()
    }

    fn manager(&mut self) -> Result<&GlobalHotKeyManager, HotKeyError> {
        if self.manager.is_none() {
            let manager =
                GlobalHotKeyManager::new().map_err(|e| HotKeyError::Unavailable(e.to_string()))?;
            self.manager = Some(manager);
        }
        self.manager
            .as_ref()
            .ok_or_else(|| HotKeyError::Unavailable("manager not initialized".into()))
    }
}

impl HotKeyBackend for GlobalHotKeyBackend {
    fn register(
        &mut self,
        hot_key: HotKey,
        events: Sender<HotKeyEvent>,
    ) -> Result<u32, HotKeyError> {
        let os_hot_key = to_os_hot_key(hot_key)?;
        let id = os_hot_key.id();

        self.manager()?
            .register(os_hot_key)
            .map_err(|e| HotKeyError::Registration(e.to_string()))?;
        self.registered = Some(os_hot_key);

        GlobalHotKeyEvent::set_event_handler(Some(move |event: GlobalHotKeyEvent| {
            forward_event(id, &events, event)
        }));

        debug!(%hot_key, id, "OS hotkey registered");
        Ok(id)
    }

    fn unregister(&mut self, id: u32) -> Result<(), HotKeyError> {
        GlobalHotKeyEvent::set_event_handler(None::<fn(GlobalHotKeyEvent)>);

        let Some(os_hot_key) = self.registered.take_if(|hk| hk.id() == id) else {
            return Ok(());
        };
        if let Some(manager) = &self.manager {
            manager
                .unregister(os_hot_key)
                .map_err(|e| HotKeyError::Registration(e.to_string()))?;
        }
        Ok(())
    }

    /// `global-hotkey` delivers presses through the registering thread's
    /// message queue on Windows and its run loop on macOS.
    fn pump(&mut self) {
        if self.registered.is_some() {
            pump_platform_loop();
        }
    }
}

/// Sends a [`HotKeyEvent::Triggered`] for presses of registration `id`.
/// Releases and other registrations are dropped.
fn forward_event(id: u32, events: &Sender<HotKeyEvent>, event: GlobalHotKeyEvent) {
    if event.id == id && event.state == HotKeyState::Pressed {
        let _ = events.send(HotKeyEvent::Triggered { id });
    }
}

#[cfg(target_os = "windows")]
fn pump_platform_loop() {
    use windows_sys::Win32::UI::WindowsAndMessaging::{
        DispatchMessageW, MSG, PM_REMOVE, PeekMessageW, TranslateMessage,
    };

    // SAFETY: MSG is plain data, and PeekMessageW only touches this
    // thread's queue.
    unsafe {
        let mut msg: MSG = std::mem::zeroed();
        while PeekMessageW(&mut msg, std::ptr::null_mut(), 0, 0, PM_REMOVE) != 0 {
            TranslateMessage(&msg);
            DispatchMessageW(&msg);
        }
    }
}

#[cfg(target_os = "macos")]
fn pump_platform_loop() {
    use core_foundation::runloop::{CFRunLoopRunInMode, kCFRunLoopDefaultMode};

    // SAFETY: runs the current thread's run loop once without blocking.
    unsafe {
        CFRunLoopRunInMode(kCFRunLoopDefaultMode, 0.0, 1);
    }
}

// X11 events are read on a thread owned by `global-hotkey`.
#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn pump_platform_loop() {}

fn to_os_hot_key(hot_key: HotKey) -> Result<OsHotKey, HotKeyError> {
    let code = keys::label_for(hot_key.key_code)
        .and_then(code_for_label)
        .ok_or(HotKeyError::UnsupportedKey(hot_key.key_code))?;

    let mut modifiers = OsModifiers::empty();
    if hot_key.modifiers.contains(Modifiers::COMMAND) {
        modifiers |= OsModifiers::SUPER;
    }
    if hot_key.modifiers.contains(Modifiers::OPTION) {
        modifiers |= OsModifiers::ALT;
    }
    if hot_key.modifiers.contains(Modifiers::SHIFT) {
        modifiers |= OsModifiers::SHIFT;
    }
    if hot_key.modifiers.contains(Modifiers::CONTROL) {
        modifiers |= OsModifiers::CONTROL;
    }

    let modifiers = (!modifiers.is_empty()).then_some(modifiers);
    Ok(OsHotKey::new(modifiers, code))
}

fn code_for_label(label: &str) -> Option<Code> {
    let code = match label {
        "A" => Code::KeyA,
        "B" => Code::KeyB,
        "C" => Code::KeyC,
        "D" => Code::KeyD,
        "E" => Code::KeyE,
        "F" => Code::KeyF,
        "G" => Code::KeyG,
        "H" => Code::KeyH,
        "I" => Code::KeyI,
        "J" => Code::KeyJ,
        "K" => Code::KeyK,
        "L" => Code::KeyL,
        "M" => Code::KeyM,
        "N" => Code::KeyN,
        "O" => Code::KeyO,
        "P" => Code::KeyP,
        "Q" => Code::KeyQ,
        "R" => Code::KeyR,
        "S" => Code::KeyS,
        "T" => Code::KeyT,
        "U" => Code::KeyU,
        "V" => Code::KeyV,
        "W" => Code::KeyW,
        "X" => Code::KeyX,
        "Y" => Code::KeyY,
        "Z" => Code::KeyZ,
        "0" => Code::Digit0,
        "1" => Code::Digit1,
        "2" => Code::Digit2,
        "3" => Code::Digit3,
        "4" => Code::Digit4,
        "5" => Code::Digit5,
        "6" => Code::Digit6,
        "7" => Code::Digit7,
        "8" => Code::Digit8,
        "9" => Code::Digit9,
        "Space" => Code::Space,
        "Return" => Code::Enter,
        "Escape" => Code::Escape,
        "Delete" => Code::Backspace,
        "Tab" => Code::Tab,
        "Left" => Code::ArrowLeft,
        "Right" => Code::ArrowRight,
        "Down" => Code::ArrowDown,
        "Up" => Code::ArrowUp,
        _ => return None,
    };
    Some(code)
}
