use crate::models::prompt::{Prompt, compare_names};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const DEFAULT_ICON: &str = "folder";

/// Named container of prompts, kept sorted by title
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    #[serde(default = "default_icon")]
    pub icon_name: String,
    pub prompts: Vec<Prompt>,
}

fn default_icon() -> String {
    DEFAULT_ICON.to_string()
}

impl Folder {
    pub fn new(name: String, icon_name: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            icon_name,
            prompts: Vec::new(),
        }
    }

    pub fn prompt(&self, prompt_id: Uuid) -> Option<&Prompt> {
        self.prompts.iter().find(|p| p.id == prompt_id)
    }

    pub fn prompt_mut(&mut self, prompt_id: Uuid) -> Option<&mut Prompt> {
        self.prompts.iter_mut().find(|p| p.id == prompt_id)
    }

    pub fn sort_prompts(&mut self) {
        self.prompts
            .sort_by(|a, b| compare_names(&a.title, &b.title));
    }

    /// Built-in dataset used on first launch and when the file is unreadable
    pub fn sample_data() -> Vec<Folder> {
        let mut work = Folder::new("Work".to_string(), "briefcase".to_string());
        work.prompts = vec![
            Prompt::new(
                "Project kickoff".to_string(),
                "Draft a concise kickoff summary with goals, scope, risks, and timeline."
                    .to_string(),
            ),
            Prompt::new(
                "Bug report".to_string(),
                "Summarize the issue, steps to reproduce, expected vs actual, and impact."
                    .to_string(),
            ),
        ];
        work.sort_prompts();

        let personal = Folder::new("Personal".to_string(), "sparkles".to_string());

        let mut folders = vec![work, personal];
        sort_folders(&mut folders);
        folders
    }
}

pub fn sort_folders(folders: &mut [Folder]) {
    folders.sort_by(|a, b| compare_names(&a.name, &b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_icon_defaults_to_folder() {
        let json = r#"{
            "id": "6f1c9c0e-2d7e-4e55-9d43-2f5b1f0c8a11",
            "name": "Legacy",
            "prompts": []
        }"#;

        let folder: Folder = serde_json::from_str(json).unwrap();
        assert_eq!(folder.icon_name, DEFAULT_ICON);
        assert_eq!(folder.name, "Legacy");
    }

    #[test]
    fn uses_camel_case_keys() {
        let folder = Folder::new("Work".into(), "briefcase".into());
        let value = serde_json::to_value(&folder).unwrap();
        assert_eq!(value["iconName"], "briefcase");
        assert!(value.get("icon_name").is_none());
    }

    #[test]
    fn sample_data_is_sorted() {
        let folders = Folder::sample_data();
        let names: Vec<_> = folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Personal", "Work"]);

        let titles: Vec<_> = folders[1].prompts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["Bug report", "Project kickoff"]);
    }
}
