pub mod export;
pub mod folder;
pub mod prompt;
pub mod settings;
pub mod storage;

pub use export::{ExportData, ExportFormat, ImportSummary, export_collection, import_collection};
pub use folder::{DEFAULT_ICON, Folder};
pub use prompt::Prompt;
pub use settings::{AppearanceMode, FontStyle, FontToken, HotKeyMode, Settings, SettingsStore};
pub use storage::StorageManager;
