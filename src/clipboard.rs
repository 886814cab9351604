//! Clipboard writes.

use clipboard_rs::{Clipboard as _, ClipboardContext};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Failed to access clipboard: {0}")]
    AccessFailed(String),

    #[error("Failed to write to clipboard: {0}")]
    WriteFailed(String),
}

pub trait Clipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError>;
}

/// True where the copied text lives only as long as the writing process.
/// X11 selections are served on request by their owner.
pub const OWNER_SERVES_SELECTION: bool = cfg!(all(unix, not(target_os = "macos")));

/// Whether a short-lived command should stay up after copying so the text
/// can still be pasted. Only asked of an interactive terminal.
pub fn must_hold_after_copy(owner_serves_selection: bool, interactive: bool) -> bool {
    owner_serves_selection && interactive
}

/// The system clipboard via `clipboard-rs`.
///
/// The context is opened on first write and kept, since on X11 the owning
/// process serves the selection.
#[derive(Default)]
pub struct SystemClipboard {
    ctx: Option<ClipboardContext>,
}

impl SystemClipboard {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Clipboard for SystemClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        let ctx = match self.ctx.take() {
            Some(ctx) => ctx,
            None => {
                ClipboardContext::new().map_err(|e| ClipboardError::AccessFailed(e.to_string()))?
            }
        };

        let written = ctx
            .set_text(text.to_string())
            .map_err(|e| ClipboardError::WriteFailed(e.to_string()));
        self.ctx = Some(ctx);
        written
    }
}

/// In-process clipboard, for tests and headless use
#[derive(Debug, Default, Clone)]
pub struct MemoryClipboard {
    contents: std::rc::Rc<std::cell::RefCell<Option<String>>>,
}

impl MemoryClipboard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last text written through any clone of this clipboard
    pub fn contents(&self) -> Option<String> {
        self.contents.borrow().clone()
    }
}

impl Clipboard for MemoryClipboard {
    fn set_text(&mut self, text: &str) -> Result<(), ClipboardError> {
        *self.contents.borrow_mut() = Some(text.to_string());
        Ok(())
    }
}
