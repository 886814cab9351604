use crate::models::Folder;
use anyhow::{Context, Result};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, warn};

const DATA_DIR_ENV: &str = "PROMPTY_DATA_DIR";
const APP_DIR: &str = "Prompty";
const LEGACY_APP_DIR: &str = "PromptBar";
const DATABASE_FILE: &str = "prompts.json";

/// Storage Manager for disk operations
///
/// Owns the location of the prompt file and the legacy location it is
/// migrated from. Loading never fails; saving is atomic.
#[derive(Debug, Clone)]
pub struct StorageManager {
    database_file: PathBuf,
    legacy_file: Option<PathBuf>,
}

impl StorageManager {
    /// Resolves `<data_dir>/Prompty/prompts.json`, or `$PROMPTY_DATA_DIR/prompts.json`
    /// when the override is set (no legacy migration in that case).
    pub fn new() -> Result<Self> {
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return Ok(Self::with_paths(PathBuf::from(dir).join(DATABASE_FILE), None));
        }

        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Ok(Self::with_paths(
            data_dir.join(APP_DIR).join(DATABASE_FILE),
            Some(data_dir.join(LEGACY_APP_DIR).join(DATABASE_FILE)),
        ))
    }

    pub fn with_paths(database_file: PathBuf, legacy_file: Option<PathBuf>) -> Self {
        Self {
            database_file,
            legacy_file,
        }
    }

    pub fn database_file(&self) -> &Path {
        &self.database_file
    }

    /// Loads the collection, falling back to the sample dataset when there
    /// is no file or it cannot be parsed.
    pub fn load(&self) -> Vec<Folder> {
        if !self.database_file.exists() {
            self.migrate_legacy_data();
        }

        if !self.database_file.exists() {
            debug!(path = %self.database_file.display(), "no prompt file, using sample data");
            return Folder::sample_data();
        }

        match self.read_database() {
            Ok(folders) => folders,
            Err(e) => {
                warn!(
                    path = %self.database_file.display(),
                    error = %format!("{e:#}"),
                    "prompt file unreadable, falling back to sample data"
                );
                match self.backup_database() {
                    Ok(backup) => info!(path = %backup.display(), "kept a copy of the unreadable file"),
                    Err(e) => warn!(error = %format!("{e:#}"), "failed to back up unreadable file"),
                }
                Folder::sample_data()
            }
        }
    }

    fn read_database(&self) -> Result<Vec<Folder>> {
        let content =
            fs::read_to_string(&self.database_file).context("Failed to read database file")?;
        serde_json::from_str(&content).context("Failed to parse database JSON")
    }

    /// Saves the collection, logging and swallowing any failure.
    /// The previous file is left untouched when the write does not complete.
    pub fn save(&self, folders: &[Folder]) {
        if let Err(e) = self.try_save(folders) {
            error!(
                path = %self.database_file.display(),
                error = %format!("{e:#}"),
                "failed to save prompts"
            );
        }
    }

    /// Serializes the whole collection to a sibling temp file, syncs it,
    /// then renames it over the database file.
    pub fn try_save(&self, folders: &[Folder]) -> Result<()> {
        let content =
            serde_json::to_string_pretty(folders).context("Failed to serialize database")?;

        let dir = self
            .database_file
            .parent()
            .context("Database file has no parent directory")?;
        fs::create_dir_all(dir).context("Failed to create data directory")?;

        let tmp_file = dir.join(format!(".{}.{}.tmp", DATABASE_FILE, std::process::id()));
        let written = (|| -> Result<()> {
            let mut file = File::create(&tmp_file).context("Failed to create temp file")?;
            file.write_all(content.as_bytes())
                .context("Failed to write temp file")?;
            file.sync_all().context("Failed to sync temp file")?;
            fs::rename(&tmp_file, &self.database_file)
                .context("Failed to replace database file")
        })();

        if written.is_err() {
            let _ = fs::remove_file(&tmp_file);
        }
        written
    }

    /// Copies the legacy file into place once. Never overwrites an existing
    /// database file and never touches the legacy copy.
    fn migrate_legacy_data(&self) {
        let Some(legacy) = &self.legacy_file else {
            return;
        };
        if !legacy.exists() {
            return;
        }

        let migrated = (|| -> Result<()> {
            if let Some(dir) = self.database_file.parent() {
                fs::create_dir_all(dir).context("Failed to create data directory")?;
            }
            if !self.database_file.exists() {
                fs::copy(legacy, &self.database_file).context("Failed to copy legacy file")?;
                info!(from = %legacy.display(), to = %self.database_file.display(), "migrated legacy prompts");
            }
            Ok(())
        })();

        if let Err(e) = migrated {
            warn!(error = %format!("{e:#}"), "failed to migrate legacy data");
        }
    }

    /// Copies the database file into `backups/` with a timestamped name
    fn backup_database(&self) -> Result<PathBuf> {
        let dir = self
            .database_file
            .parent()
            .context("Database file has no parent directory")?;
        let backup_dir = dir.join("backups");
        fs::create_dir_all(&backup_dir)?;

        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let backup_file = backup_dir.join(format!("prompts-{}.json", timestamp));

        fs::copy(&self.database_file, &backup_file)?;

        Ok(backup_file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Prompt;
    use tempfile::TempDir;

    fn storage_in(dir: &TempDir) -> StorageManager {
        StorageManager::with_paths(
            dir.path().join("Prompty").join(DATABASE_FILE),
            Some(dir.path().join("PromptBar").join(DATABASE_FILE)),
        )
    }

    fn sample_collection() -> Vec<Folder> {
        let mut folder = Folder::new("Work".into(), "briefcase".into());
        folder
            .prompts
            .push(Prompt::new("Standup".into(), "Give a 2-minute update".into()));
        vec![folder, Folder::new("Zeta".into(), "folder".into())]
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let folders = sample_collection();

        storage.try_save(&folders).unwrap();

        assert_eq!(storage.load(), folders);
    }

    #[test]
    fn missing_file_yields_sample_data() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);

        let folders = storage.load();

        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Personal", "Work"]);
        assert!(!storage.database_file().exists());
    }

    #[test]
    fn malformed_file_yields_sample_data_and_backup() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        fs::create_dir_all(storage.database_file().parent().unwrap()).unwrap();
        fs::write(storage.database_file(), "{ not json").unwrap();

        let folders = storage.load();

        assert_eq!(folders.len(), 2);
        let backups: Vec<_> = fs::read_dir(dir.path().join("Prompty").join("backups"))
            .unwrap()
            .collect();
        assert_eq!(backups.len(), 1);
    }

    #[test]
    fn legacy_file_is_copied_once() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let legacy = dir.path().join("PromptBar").join(DATABASE_FILE);
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        let folders = sample_collection();
        fs::write(&legacy, serde_json::to_string(&folders).unwrap()).unwrap();

        assert_eq!(storage.load(), folders);
        assert!(storage.database_file().exists());
        assert!(legacy.exists());
    }

    #[test]
    fn legacy_file_never_overwrites_current() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let current = sample_collection();
        storage.try_save(&current).unwrap();

        let legacy = dir.path().join("PromptBar").join(DATABASE_FILE);
        fs::create_dir_all(legacy.parent().unwrap()).unwrap();
        fs::write(&legacy, serde_json::to_string(&Folder::sample_data()).unwrap()).unwrap();

        assert_eq!(storage.load(), current);
    }

    #[test]
    fn failed_save_keeps_previous_file() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let folders = sample_collection();
        storage.try_save(&folders).unwrap();

        // A directory squatting on the temp path makes File::create fail.
        let tmp = storage
            .database_file()
            .parent()
            .unwrap()
            .join(format!(".{}.{}.tmp", DATABASE_FILE, std::process::id()));
        fs::create_dir_all(&tmp).unwrap();

        storage.save(&Folder::sample_data());

        assert_eq!(storage.load(), folders);
    }

    #[test]
    fn output_is_deterministic() {
        let dir = TempDir::new().unwrap();
        let storage = storage_in(&dir);
        let folders = sample_collection();

        storage.try_save(&folders).unwrap();
        let first = fs::read_to_string(storage.database_file()).unwrap();
        storage.try_save(&folders).unwrap();
        let second = fs::read_to_string(storage.database_file()).unwrap();

        assert_eq!(first, second);
        assert!(first.contains("\"updatedAt\""));
    }
}
