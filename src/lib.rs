//! prompty - prompt launcher
//!
//! Stores short reusable text snippets ("prompts") in folders, copies them to
//! the clipboard in one step and pops the collection up on a global hotkey.
//!
//! - [`store::PromptStore`] owns the collection, search and selection state
//! - [`models::StorageManager`] persists it as JSON
//! - [`hotkey::HotKeyManager`] captures the global key combination
//! - [`models::SettingsStore`] keeps user preferences

pub mod cli;
pub mod clipboard;
pub mod hotkey;
pub mod logging;
pub mod models;
pub mod search;
pub mod store;
