use crate::cli::{bar, open_settings, tree};
use crate::hotkey::{HotKeyManager, RegistrationMode};
use crate::models::{Folder, StorageManager};
use colored::Colorize;
use std::error::Error;
use std::fs;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, SystemTime};
use tracing::{debug, info, warn};

const TICK: Duration = Duration::from_millis(200);

/// Folders as last read from disk, reloaded only when the file changes.
///
/// Loading an unreadable file backs it up, so reloading it on every press
/// would pile up identical backups.
struct FolderCache {
    storage: StorageManager,
    stamp: Option<(SystemTime, u64)>,
    folders: Vec<Folder>,
}

impl FolderCache {
    fn new(storage: StorageManager) -> Self {
        let stamp = file_stamp(&storage);
        let folders = storage.load();
        Self {
            storage,
            stamp,
            folders,
        }
    }

    /// Reloads if the file's mtime or size moved. Returns whether it did.
    fn refresh(&mut self) -> bool {
        let stamp = file_stamp(&self.storage);
        if stamp == self.stamp {
            return false;
        }
        debug!("prompt file changed, reloading");
        self.stamp = stamp;
        self.folders = self.storage.load();
        true
    }

    fn folders(&self) -> &[Folder] {
        &self.folders
    }
}

fn file_stamp(storage: &StorageManager) -> Option<(SystemTime, u64)> {
    let meta = fs::metadata(storage.database_file()).ok()?;
    Some((meta.modified().ok()?, meta.len()))
}

/// Registers the configured hotkey and prints the prompt tree on every press
/// until Ctrl+C.
pub fn listen() -> Result<(), Box<dyn Error>> {
    let settings = open_settings()?;
    let hot_key = settings.resolved_hot_key();
    let storage = StorageManager::new()?;

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        ctrlc::set_handler(move || shutdown.store(true, Ordering::SeqCst))?;
    }

    let mut cache = FolderCache::new(storage);
    let mut manager = HotKeyManager::system(shutdown.clone());
    manager.set_handler(move || {
        // Edits from other invocations show up on the next press.
        cache.refresh();
        if let Err(e) = tree::print_raw_lines(&tree::render_tree(cache.folders(), None)) {
            warn!(error = %e, "failed to print prompts");
        }
    });

    match manager.register(hot_key) {
        RegistrationMode::Primary => println!(
            "{}  Listening for {} (Ctrl+C to quit)",
            bar(),
            hot_key.to_string().bright_green()
        ),
        RegistrationMode::Fallback => tree::print_raw_lines(&[
            format!(
                "{}  Global hotkey unavailable, press {} in this terminal (Ctrl+C to quit)",
                bar(),
                hot_key.to_string().bright_yellow()
            ),
        ])?,
        RegistrationMode::Idle => {
            return Err(format!("could not register {hot_key} or watch the keyboard").into());
        }
    }

    let mut presses = 0;
    while !shutdown.load(Ordering::SeqCst) {
        presses += manager.wait(TICK);
    }

    // Leaves raw mode before the final line is printed.
    manager.unregister();
    info!(presses, "listener stopped");
    println!("{}  Bye!", bar());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> StorageManager {
        StorageManager::with_paths(dir.path().join("Prompty").join("prompts.json"), None)
    }

    fn backups(dir: &TempDir) -> usize {
        fs::read_dir(dir.path().join("Prompty").join("backups"))
            .map(|entries| entries.count())
            .unwrap_or(0)
    }

    #[test]
    fn unreadable_file_is_loaded_and_backed_up_once() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(dir.path().join("Prompty")).unwrap();
        fs::write(storage.database_file(), "{ not json").unwrap();

        let mut cache = FolderCache::new(storage);
        assert_eq!(cache.folders().len(), Folder::sample_data().len());

        for _ in 0..5 {
            assert!(!cache.refresh());
        }
        assert_eq!(backups(&dir), 1);
    }

    #[test]
    fn edited_file_is_picked_up() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        storage.try_save(&Folder::sample_data()).unwrap();

        let mut cache = FolderCache::new(storage);
        assert_eq!(cache.folders().len(), 2);
        assert!(!cache.refresh());

        let path = cache.storage.database_file().to_path_buf();
        fs::write(&path, "[]").unwrap();

        assert!(cache.refresh());
        assert!(cache.folders().is_empty());
    }
}
