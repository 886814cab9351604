//! Case-insensitive substring filtering over folders and prompts.

use crate::models::{Folder, Prompt};

/// Folders whose name contains `query`. A blank query matches everything.
pub fn filter_folders<'a>(folders: &'a [Folder], query: &str) -> Vec<&'a Folder> {
    let query = query.trim();
    if query.is_empty() {
        return folders.iter().collect();
    }

    let needle = query.to_lowercase();
    folders
        .iter()
        .filter(|folder| folder.name.to_lowercase().contains(&needle))
        .collect()
}

/// Prompts whose title or content contains `query`. A blank query matches
/// everything, in folder order.
pub fn filter_prompts<'a>(folder: &'a Folder, query: &str) -> Vec<&'a Prompt> {
    let query = query.trim();
    if query.is_empty() {
        return folder.prompts.iter().collect();
    }

    let needle = query.to_lowercase();
    folder
        .prompts
        .iter()
        .filter(|prompt| prompt.matches(&needle))
        .collect()
}

/// A prompt match together with the folder it lives in
#[derive(Debug, Clone, Copy)]
pub struct PromptHit<'a> {
    pub folder: &'a Folder,
    pub prompt: &'a Prompt,
}

/// Prompt matches across every folder, for the command line
pub fn search_all<'a>(folders: &'a [Folder], query: &str) -> Vec<PromptHit<'a>> {
    if query.trim().is_empty() {
        return Vec::new();
    }

    folders
        .iter()
        .flat_map(|folder| {
            filter_prompts(folder, query)
                .into_iter()
                .map(move |prompt| PromptHit { folder, prompt })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn titles(prompts: &[&Prompt]) -> Vec<String> {
        prompts.iter().map(|p| p.title.clone()).collect()
    }

    #[test]
    fn blank_query_returns_everything() {
        let folders = Folder::sample_data();
        assert_eq!(filter_folders(&folders, "  ").len(), 2);

        let work = folders.iter().find(|f| f.name == "Work").unwrap();
        assert_eq!(filter_prompts(work, "").len(), 2);
    }

    #[test]
    fn folder_name_match_is_case_insensitive() {
        let folders = Folder::sample_data();
        let hits = filter_folders(&folders, "WOR");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].name, "Work");
    }

    #[test]
    fn prompt_matches_title_or_content() {
        let folders = Folder::sample_data();
        let work = folders.iter().find(|f| f.name == "Work").unwrap();

        assert_eq!(titles(&filter_prompts(work, "bug")), ["Bug report"]);
        assert_eq!(titles(&filter_prompts(work, "TIMELINE")), ["Project kickoff"]);
        assert!(filter_prompts(work, "nothing like this").is_empty());
    }

    #[test]
    fn query_is_trimmed() {
        let folders = Folder::sample_data();
        let work = folders.iter().find(|f| f.name == "Work").unwrap();
        assert_eq!(titles(&filter_prompts(work, "  bug  ")), ["Bug report"]);
    }

    #[test]
    fn search_all_reports_folder() {
        let folders = Folder::sample_data();
        let hits = search_all(&folders, "steps to reproduce");

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].folder.name, "Work");
        assert_eq!(hits[0].prompt.title, "Bug report");
        assert!(search_all(&folders, "").is_empty());
    }
}
