//! The in-memory prompt collection and its selection state.
//!
//! Every mutation rewrites the whole collection through [`StorageManager`].
//! Invalid input (blank names, unknown ids) makes an operation a no-op.

use crate::clipboard::Clipboard;
use crate::models::export::merge_import;
use crate::models::folder::sort_folders;
use crate::models::prompt::normalize_name;
use crate::models::{DEFAULT_ICON, Folder, ImportSummary, Prompt, StorageManager};
use crate::search::{filter_folders, filter_prompts};
use tracing::{debug, warn};
use uuid::Uuid;

pub struct PromptStore {
    storage: StorageManager,
    clipboard: Box<dyn Clipboard>,
    folders: Vec<Folder>,
    selected_folder_id: Option<Uuid>,
    selected_prompt_id: Option<Uuid>,
    search_query: String,
    last_copied_prompt_id: Option<Uuid>,
}

impl PromptStore {
    /// Loads the collection from `storage`, sorted
    pub fn new(storage: StorageManager, clipboard: Box<dyn Clipboard>) -> Self {
        let mut folders = storage.load();
        for folder in &mut folders {
            folder.sort_prompts();
        }
        sort_folders(&mut folders);

        Self {
            storage,
            clipboard,
            folders,
            selected_folder_id: None,
            selected_prompt_id: None,
            search_query: String::new(),
            last_copied_prompt_id: None,
        }
    }

    pub fn storage(&self) -> &StorageManager {
        &self.storage
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, id: Uuid) -> Option<&Folder> {
        self.folders.iter().find(|f| f.id == id)
    }

    fn folder_mut(&mut self, id: Uuid) -> Option<&mut Folder> {
        self.folders.iter_mut().find(|f| f.id == id)
    }

    /// Exact (case-insensitive) name match first, then the first folder whose
    /// name contains `name`.
    pub fn find_folder_by_name(&self, name: &str) -> Option<&Folder> {
        let needle = name.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        self.folders
            .iter()
            .find(|f| f.name.to_lowercase() == needle)
            .or_else(|| {
                self.folders
                    .iter()
                    .find(|f| f.name.to_lowercase().contains(&needle))
            })
    }

    /// Same lookup rules as [`Self::find_folder_by_name`], on prompt titles
    pub fn find_prompt(&self, folder_id: Uuid, title: &str) -> Option<&Prompt> {
        let folder = self.folder(folder_id)?;
        let needle = title.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }

        folder
            .prompts
            .iter()
            .find(|p| p.title.to_lowercase() == needle)
            .or_else(|| {
                folder
                    .prompts
                    .iter()
                    .find(|p| p.title.to_lowercase().contains(&needle))
            })
    }

    pub fn selected_folder_id(&self) -> Option<Uuid> {
        self.selected_folder_id
    }

    pub fn selected_prompt_id(&self) -> Option<Uuid> {
        self.selected_prompt_id
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn last_copied_prompt_id(&self) -> Option<Uuid> {
        self.last_copied_prompt_id
    }

    pub fn add_folder(&mut self, name: &str, icon_name: Option<&str>) -> Option<Uuid> {
        let name = normalize_name(name)?;
        let icon = icon_name
            .and_then(normalize_name)
            .unwrap_or_else(|| DEFAULT_ICON.to_string());

        let folder = Folder::new(name, icon);
        let id = folder.id;
        debug!(%id, name = %folder.name, "adding folder");
        self.folders.push(folder);
        sort_folders(&mut self.folders);
        self.persist();
        Some(id)
    }

    /// Renames a folder, keeping its icon
    pub fn rename_folder(&mut self, id: Uuid, name: &str) -> bool {
        let Some(icon) = self.folder(id).map(|f| f.icon_name.clone()) else {
            return false;
        };
        self.update_folder(id, name, &icon)
    }

    pub fn update_folder(&mut self, id: Uuid, name: &str, icon_name: &str) -> bool {
        let Some(name) = normalize_name(name) else {
            return false;
        };
        let icon = normalize_name(icon_name).unwrap_or_else(|| DEFAULT_ICON.to_string());
        let Some(folder) = self.folder_mut(id) else {
            return false;
        };

        folder.name = name;
        folder.icon_name = icon;
        sort_folders(&mut self.folders);
        self.persist();
        true
    }

    /// Removes the folder and everything in it
    pub fn delete_folder(&mut self, id: Uuid) -> bool {
        let before = self.folders.len();
        self.folders.retain(|f| f.id != id);
        if self.folders.len() == before {
            return false;
        }

        if self.selected_folder_id == Some(id) {
            self.selected_folder_id = None;
            self.selected_prompt_id = None;
        }
        self.persist();
        true
    }

    pub fn add_prompt(&mut self, folder_id: Uuid, title: &str, content: &str) -> Option<Uuid> {
        let title = normalize_name(title)?;
        let folder = self.folder_mut(folder_id)?;

        let prompt = Prompt::new(title, content.to_string());
        let id = prompt.id;
        folder.prompts.push(prompt);
        folder.sort_prompts();
        self.persist();
        Some(id)
    }

    pub fn update_prompt(
        &mut self,
        folder_id: Uuid,
        prompt_id: Uuid,
        title: &str,
        content: &str,
    ) -> bool {
        let Some(title) = normalize_name(title) else {
            return false;
        };
        let Some(folder) = self.folder_mut(folder_id) else {
            return false;
        };
        let Some(prompt) = folder.prompt_mut(prompt_id) else {
            return false;
        };

        prompt.update(title, content.to_string());
        folder.sort_prompts();
        self.persist();
        true
    }

    /// Changes the title, keeping the content
    pub fn rename_prompt(&mut self, folder_id: Uuid, prompt_id: Uuid, title: &str) -> bool {
        let Some(content) = self
            .folder(folder_id)
            .and_then(|f| f.prompt(prompt_id))
            .map(|p| p.content.clone())
        else {
            return false;
        };
        self.update_prompt(folder_id, prompt_id, title, &content)
    }

    pub fn delete_prompt(&mut self, folder_id: Uuid, prompt_id: Uuid) -> bool {
        let Some(folder) = self.folder_mut(folder_id) else {
            return false;
        };
        let before = folder.prompts.len();
        folder.prompts.retain(|p| p.id != prompt_id);
        if folder.prompts.len() == before {
            return false;
        }

        if self.selected_prompt_id == Some(prompt_id) {
            self.selected_prompt_id = None;
        }
        self.persist();
        true
    }

    /// All folders while one is selected; otherwise folders matching `query`
    pub fn filtered_folders(&self, query: &str) -> Vec<&Folder> {
        if self.selected_folder_id.is_some() {
            return self.folders.iter().collect();
        }
        filter_folders(&self.folders, query)
    }

    pub fn filtered_prompts(&self, folder_id: Uuid, query: &str) -> Vec<&Prompt> {
        match self.folder(folder_id) {
            Some(folder) => filter_prompts(folder, query),
            None => Vec::new(),
        }
    }

    /// Selecting a folder clears the prompt selection and the search query
    pub fn select_folder(&mut self, folder_id: Option<Uuid>) {
        self.selected_folder_id = folder_id;
        self.selected_prompt_id = None;
        self.search_query.clear();
    }

    pub fn select_prompt(&mut self, prompt_id: Option<Uuid>) {
        self.selected_prompt_id = prompt_id;
    }

    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    /// Puts the prompt content on the clipboard. Returns false, and leaves
    /// `last_copied_prompt_id` alone, if the clipboard write failed.
    pub fn copy_prompt(&mut self, prompt: &Prompt) -> bool {
        match self.clipboard.set_text(&prompt.content) {
            Ok(()) => {
                debug!(id = %prompt.id, "copied prompt");
                self.last_copied_prompt_id = Some(prompt.id);
                true
            }
            Err(e) => {
                warn!(id = %prompt.id, error = %e, "failed to copy prompt");
                false
            }
        }
    }

    /// Merges imported folders and persists if anything changed
    pub fn import(&mut self, folders: Vec<Folder>, overwrite: bool) -> ImportSummary {
        let summary = merge_import(&mut self.folders, folders, overwrite);
        if !summary.is_empty() {
            self.persist();
        }
        summary
    }

    fn persist(&self) {
        self.storage.save(&self.folders);
    }
}
