use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::folder::sort_folders;
use crate::models::prompt::normalize_name;
use crate::models::{Folder, Prompt};

/// Export format, picked from the file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Yaml,
}

impl ExportFormat {
    /// `.yaml`/`.yml` means YAML, anything else JSON
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                ExportFormat::Yaml
            }
            _ => ExportFormat::Json,
        }
    }
}

/// Export file structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportData {
    pub version: String,
    pub created_at: DateTime<Utc>,
    pub folders: Vec<Folder>,
}

impl ExportData {
    pub fn new(folders: &[Folder]) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            created_at: Utc::now(),
            folders: folders.to_vec(),
        }
    }
}

/// An import file is either a full export or a bare `prompts.json` array
#[derive(Deserialize)]
#[serde(untagged)]
enum ImportFile {
    Export(ExportData),
    Collection(Vec<Folder>),
}

impl From<ImportFile> for Vec<Folder> {
    fn from(file: ImportFile) -> Self {
        match file {
            ImportFile::Export(data) => data.folders,
            ImportFile::Collection(folders) => folders,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub folders_added: usize,
    pub folders_updated: usize,
    pub prompts_added: usize,
    pub prompts_updated: usize,
}

impl ImportSummary {
    pub fn is_empty(&self) -> bool {
        *self == ImportSummary::default()
    }
}

/// Writes the whole collection to `path`
pub fn export_collection(folders: &[Folder], path: &Path) -> Result<()> {
    let data = ExportData::new(folders);

    let content = match ExportFormat::from_path(path) {
        ExportFormat::Json => serde_json::to_string_pretty(&data)
            .context("Failed to serialize collection to JSON")?,
        ExportFormat::Yaml => {
            serde_yaml::to_string(&data).context("Failed to serialize collection to YAML")?
        }
    };

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).context("Failed to create export directory")?;
    }
    fs::write(path, content).context("Failed to write export file")?;

    debug!(path = %path.display(), folders = folders.len(), "exported collection");
    Ok(())
}

/// Reads folders from an export file or a plain collection file
pub fn import_collection(path: &Path) -> Result<Vec<Folder>> {
    let contents = fs::read_to_string(path).context("Failed to read import file")?;

    let file: ImportFile = match ExportFormat::from_path(path) {
        ExportFormat::Json => {
            serde_json::from_str(&contents).context("Failed to parse JSON import file")?
        }
        ExportFormat::Yaml => {
            serde_yaml::from_str(&contents).context("Failed to parse YAML import file")?
        }
    };

    Ok(file.into())
}

/// Merges imported folders into `folders`, matching on ids.
///
/// Unknown folders and prompts are added. Known ones are replaced only when
/// `overwrite` is set. Entries with a blank name or title are skipped, as are
/// repeated folder ids and prompts whose id already lives in another folder.
/// Leaves the collection sorted.
pub fn merge_import(
    folders: &mut Vec<Folder>,
    imported: Vec<Folder>,
    overwrite: bool,
) -> ImportSummary {
    let mut summary = ImportSummary::default();
    let mut owners: HashMap<Uuid, Uuid> = folders
        .iter()
        .flat_map(|f| f.prompts.iter().map(move |p| (p.id, f.id)))
        .collect();
    let mut seen_folders = HashSet::new();
    let mut seen_prompts = HashSet::new();

    for incoming in imported {
        let Some(name) = normalize_name(&incoming.name) else {
            continue;
        };
        if !seen_folders.insert(incoming.id) {
            warn!(id = %incoming.id, "skipping repeated folder id in import");
            continue;
        }

        let folder_id = incoming.id;
        let prompts: Vec<Prompt> = incoming
            .prompts
            .into_iter()
            .filter_map(|mut prompt| {
                prompt.title = normalize_name(&prompt.title)?;
                let owned_elsewhere = owners.get(&prompt.id).is_some_and(|o| *o != folder_id);
                if owned_elsewhere || !seen_prompts.insert(prompt.id) {
                    warn!(id = %prompt.id, "skipping prompt id already used by another folder");
                    return None;
                }
                owners.insert(prompt.id, folder_id);
                Some(prompt)
            })
            .collect();

        match folders.iter_mut().find(|f| f.id == folder_id) {
            Some(existing) => {
                if overwrite && (existing.name != name || existing.icon_name != incoming.icon_name)
                {
                    existing.name = name;
                    existing.icon_name = incoming.icon_name;
                    summary.folders_updated += 1;
                }
                for prompt in prompts {
                    match existing.prompt_mut(prompt.id) {
                        Some(current) if overwrite => {
                            if *current != prompt {
                                *current = prompt;
                                summary.prompts_updated += 1;
                            }
                        }
                        Some(_) => {}
                        None => {
                            existing.prompts.push(prompt);
                            summary.prompts_added += 1;
                        }
                    }
                }
                existing.sort_prompts();
            }
            None => {
                let mut folder = Folder {
                    id: folder_id,
                    name,
                    icon_name: incoming.icon_name,
                    prompts,
                };
                folder.sort_prompts();
                summary.folders_added += 1;
                summary.prompts_added += folder.prompts.len();
                folders.push(folder);
            }
        }
    }

    sort_folders(folders);
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn work_folder() -> Folder {
        let mut folder = Folder::new("Work".into(), "briefcase".into());
        folder
            .prompts
            .push(Prompt::new("Standup".into(), "Give a 2-minute update".into()));
        folder
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(ExportFormat::from_path(Path::new("a.yaml")), ExportFormat::Yaml);
        assert_eq!(ExportFormat::from_path(Path::new("a.YML")), ExportFormat::Yaml);
        assert_eq!(ExportFormat::from_path(Path::new("a.json")), ExportFormat::Json);
        assert_eq!(ExportFormat::from_path(Path::new("a")), ExportFormat::Json);
    }

    #[test]
    fn export_then_import_json() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.json");
        let folders = vec![work_folder()];

        export_collection(&folders, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"createdAt\""));
        assert_eq!(import_collection(&path).unwrap(), folders);
    }

    #[test]
    fn export_then_import_yaml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("out.yaml");
        let folders = Folder::sample_data();

        export_collection(&folders, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("iconName: briefcase"));
        assert_eq!(import_collection(&path).unwrap(), folders);
    }

    #[test]
    fn import_accepts_bare_collection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("prompts.json");
        let folders = vec![work_folder()];
        fs::write(&path, serde_json::to_string(&folders).unwrap()).unwrap();

        assert_eq!(import_collection(&path).unwrap(), folders);
    }

    #[test]
    fn import_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, "[1, 2").unwrap();

        assert!(import_collection(&path).is_err());
    }

    #[test]
    fn merge_adds_unknown_folders_sorted() {
        let mut folders = vec![work_folder()];
        let summary = merge_import(&mut folders, Folder::sample_data(), false);

        assert_eq!(summary.folders_added, 2);
        assert_eq!(summary.prompts_added, 2);
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Personal", "Work", "Work"]);
    }

    #[test]
    fn merge_keeps_existing_without_overwrite() {
        let mut folders = vec![work_folder()];
        let mut incoming = folders.clone();
        incoming[0].name = "Office".into();
        incoming[0].prompts[0].content = "changed".into();
        incoming[0]
            .prompts
            .push(Prompt::new("Retro".into(), "What went well".into()));

        let summary = merge_import(&mut folders, incoming, false);

        assert_eq!(summary.prompts_added, 1);
        assert_eq!(summary.prompts_updated, 0);
        assert_eq!(folders[0].name, "Work");
        assert_eq!(folders[0].prompts[0].content, "Give a 2-minute update");
        let titles: Vec<_> = folders[0].prompts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Retro", "Standup"]);
    }

    #[test]
    fn merge_overwrites_when_asked() {
        let mut folders = vec![work_folder()];
        let mut incoming = folders.clone();
        incoming[0].name = "Office".into();
        incoming[0].prompts[0].content = "changed".into();

        let summary = merge_import(&mut folders, incoming, true);

        assert_eq!(summary.folders_updated, 1);
        assert_eq!(summary.prompts_updated, 1);
        assert_eq!(folders[0].name, "Office");
        assert_eq!(folders[0].prompts[0].content, "changed");
    }

    #[test]
    fn merge_skips_blank_names() {
        let mut folders = Vec::new();
        let mut blank = Folder::new("   ".into(), "folder".into());
        blank.prompts.push(Prompt::new("x".into(), String::new()));
        let mut good = Folder::new(" Ideas ".into(), "folder".into());
        good.prompts.push(Prompt::new("  ".into(), "dropped".into()));

        let summary = merge_import(&mut folders, vec![blank, good], false);

        assert_eq!(summary.folders_added, 1);
        assert_eq!(summary.prompts_added, 0);
        assert_eq!(folders[0].name, "Ideas");
    }

    #[test]
    fn merge_of_same_data_is_empty() {
        let mut folders = Folder::sample_data();
        let summary = merge_import(&mut folders, Folder::sample_data(), false);
        // fresh ids, so everything is new
        assert_eq!(summary.folders_added, 2);

        let mut folders = Folder::sample_data();
        let same = folders.clone();
        assert!(merge_import(&mut folders, same, true).is_empty());
    }

    #[test]
    fn merge_never_duplicates_a_prompt_id() {
        let mut folders = vec![work_folder()];
        let shared = folders[0].prompts[0].clone();

        let mut other = Folder::new("Personal".into(), "person".into());
        other.prompts.push(shared.clone());
        other.prompts.push(shared.clone());

        let summary = merge_import(&mut folders, vec![other], true);

        assert_eq!(summary.folders_added, 1);
        assert_eq!(summary.prompts_added, 0);
        let copies = folders
            .iter()
            .flat_map(|f| &f.prompts)
            .filter(|p| p.id == shared.id)
            .count();
        assert_eq!(copies, 1);
        assert_eq!(folders[1].name, "Work");
    }

    #[test]
    fn merge_keeps_first_of_repeated_folder_ids() {
        let mut folders = Vec::new();
        let first = work_folder();
        let mut repeat = first.clone();
        repeat.name = "Office".into();
        repeat
            .prompts
            .push(Prompt::new("Retro".into(), "What went well".into()));

        let summary = merge_import(&mut folders, vec![first, repeat], true);

        assert_eq!(summary.folders_added, 1);
        assert_eq!(summary.prompts_added, 1);
        assert_eq!(folders.len(), 1);
        assert_eq!(folders[0].name, "Work");
    }

    #[test]
    fn merge_drops_repeated_prompt_within_one_folder() {
        let mut folders = Vec::new();
        let mut incoming = work_folder();
        let again = incoming.prompts[0].clone();
        incoming.prompts.push(again);

        let summary = merge_import(&mut folders, vec![incoming], false);

        assert_eq!(summary.prompts_added, 1);
        assert_eq!(folders[0].prompts.len(), 1);
    }
}
