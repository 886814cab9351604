//! Global hotkey capture.
//!
//! A single key combination is registered with the OS through a
//! [`HotKeyBackend`]. When that fails, [`KeyEventMonitor`]s watch raw
//! key-down events instead and the manager matches them itself. Both paths
//! only push [`HotKeyEvent`]s into a channel; the owning thread drains it
//! and runs the callback.

pub mod backend;
pub mod keys;
pub mod manager;
pub mod monitor;

pub use backend::GlobalHotKeyBackend;
pub use manager::{DEBOUNCE_WINDOW, HotKeyManager, RegistrationMode};
pub use monitor::TerminalKeyMonitor;

use anyhow::bail;
use flume::Sender;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};
use std::str::FromStr;
use std::time::Instant;
use thiserror::Error;

/// Modifier bitmask, using the Carbon bit values so persisted masks stay
/// compatible across versions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Modifiers(u32);

impl Modifiers {
    pub const NONE: Modifiers = Modifiers(0);
    pub const COMMAND: Modifiers = Modifiers(0x0100);
    pub const SHIFT: Modifiers = Modifiers(0x0200);
    pub const OPTION: Modifiers = Modifiers(0x0800);
    pub const CONTROL: Modifiers = Modifiers(0x1000);

    const KNOWN: u32 = 0x0100 | 0x0200 | 0x0800 | 0x1000;

    /// Unknown bits are dropped
    pub const fn from_bits(bits: u32) -> Self {
        Modifiers(bits & Self::KNOWN)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Modifiers) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Modifiers {
    type Output = Modifiers;

    fn bitor(self, rhs: Modifiers) -> Modifiers {
        Modifiers(self.0 | rhs.0)
    }
}

impl BitOrAssign for Modifiers {
    fn bitor_assign(&mut self, rhs: Modifiers) {
        self.0 |= rhs.0;
    }
}

/// A key code plus modifier mask
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HotKey {
    pub key_code: u32,
    pub modifiers: Modifiers,
}

impl HotKey {
    pub const fn new(key_code: u32, modifiers: Modifiers) -> Self {
        Self {
            key_code,
            modifiers,
        }
    }
}

/// Built-in shortcut choices
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum HotKeyPreset {
    #[default]
    CommandShiftSpace,
    CommandOptionP,
    CommandShiftP,
    CommandOptionSpace,
}

impl HotKeyPreset {
    pub const ALL: [HotKeyPreset; 4] = [
        HotKeyPreset::CommandShiftSpace,
        HotKeyPreset::CommandOptionP,
        HotKeyPreset::CommandShiftP,
        HotKeyPreset::CommandOptionSpace,
    ];

    pub fn hot_key(&self) -> HotKey {
        match self {
            HotKeyPreset::CommandShiftSpace => {
                HotKey::new(keys::SPACE, Modifiers::COMMAND | Modifiers::SHIFT)
            }
            HotKeyPreset::CommandOptionP => {
                HotKey::new(keys::P, Modifiers::COMMAND | Modifiers::OPTION)
            }
            HotKeyPreset::CommandShiftP => {
                HotKey::new(keys::P, Modifiers::COMMAND | Modifiers::SHIFT)
            }
            HotKeyPreset::CommandOptionSpace => {
                HotKey::new(keys::SPACE, Modifiers::COMMAND | Modifiers::OPTION)
            }
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            HotKeyPreset::CommandShiftSpace => "commandShiftSpace",
            HotKeyPreset::CommandOptionP => "commandOptionP",
            HotKeyPreset::CommandShiftP => "commandShiftP",
            HotKeyPreset::CommandOptionSpace => "commandOptionSpace",
        }
    }
}

impl fmt::Display for HotKeyPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            HotKeyPreset::CommandShiftSpace => "Command + Shift + Space",
            HotKeyPreset::CommandOptionP => "Command + Option + P",
            HotKeyPreset::CommandShiftP => "Command + Shift + P",
            HotKeyPreset::CommandOptionSpace => "Command + Option + Space",
        };
        f.write_str(name)
    }
}

impl FromStr for HotKeyPreset {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        let wanted = s.trim();
        match HotKeyPreset::ALL
            .into_iter()
            .find(|p| p.key().eq_ignore_ascii_case(wanted))
        {
            Some(preset) => Ok(preset),
            None => bail!("unknown hotkey preset: {s}"),
        }
    }
}

/// A raw key press seen by a fallback monitor
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KeyDown {
    pub key_code: u32,
    pub modifiers: Modifiers,
    pub timestamp: Instant,
}

/// Messages delivered to the control thread
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HotKeyEvent {
    /// The OS reported a press of the registration with this id
    Triggered { id: u32 },
    KeyDown(KeyDown),
}

#[derive(Debug, Error)]
pub enum HotKeyError {
    #[error("global hotkeys unavailable: {0}")]
    Unavailable(String),

    #[error("key code {0} has no OS mapping")]
    UnsupportedKey(u32),

    #[error("registration rejected: {0}")]
    Registration(String),

    #[error("key monitor failed: {0}")]
    Monitor(String),
}

/// OS-level hotkey registration
pub trait HotKeyBackend {
    /// Registers `hot_key`; presses are reported on `events` as
    /// [`HotKeyEvent::Triggered`] carrying the returned id.
    fn register(&mut self, hot_key: HotKey, events: Sender<HotKeyEvent>)
    -> Result<u32, HotKeyError>;

    fn unregister(&mut self, id: u32) -> Result<(), HotKeyError>;

    /// Runs one non-blocking pass of the platform event loop on the
    /// registering thread, so pending presses reach `events`.
    fn pump(&mut self) {}
}

/// Key-down observer used when OS registration is unavailable
pub trait KeyEventMonitor {
    fn name(&self) -> &'static str;

    /// Starts forwarding key-down events as [`HotKeyEvent::KeyDown`]
    fn start(&mut self, events: Sender<HotKeyEvent>) -> Result<(), HotKeyError>;

    /// Stops forwarding. Safe to call when not started.
    fn stop(&mut self);
}
