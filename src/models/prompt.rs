use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;
use uuid::Uuid;

/// A titled block of reusable text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prompt {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub updated_at: DateTime<Utc>,
}

impl Prompt {
    pub fn new(title: String, content: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            title,
            content,
            updated_at: Utc::now(),
        }
    }

    /// Replaces title and content and bumps `updated_at`.
    ///
    /// The timestamp never moves backwards, even if the wall clock does.
    pub fn update(&mut self, title: String, content: String) {
        self.title = title;
        self.content = content;
        self.updated_at = Utc::now().max(self.updated_at);
    }

    /// Case-insensitive substring match against title or content.
    /// `needle` must already be lowercased.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle) || self.content.to_lowercase().contains(needle)
    }

    /// First line of the content, for one-line listings
    pub fn preview(&self) -> &str {
        self.content.lines().next().unwrap_or_default().trim()
    }
}

/// Case- and accent-insensitive ordering for folder names and prompt titles.
/// Ties fall back to the raw strings so the order stays total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    fold(a)
        .cmp(&fold(b))
        .then_with(|| a.to_lowercase().cmp(&b.to_lowercase()))
        .then_with(|| a.cmp(b))
}

/// Lowercased with diacritics stripped, so "Éclair" files under E
fn fold(name: &str) -> String {
    name.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Trims user input; `None` when nothing is left.
pub fn normalize_name(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_never_moves_timestamp_backwards() {
        let mut prompt = Prompt::new("Standup".into(), "old".into());
        let future = Utc::now() + chrono::Duration::days(1);
        prompt.updated_at = future;

        prompt.update("Standup".into(), "new".into());

        assert_eq!(prompt.content, "new");
        assert!(prompt.updated_at >= future);
    }

    #[test]
    fn matches_title_or_content() {
        let prompt = Prompt::new("Bug report".into(), "Steps to reproduce".into());
        assert!(prompt.matches("bug"));
        assert!(prompt.matches("reproduce"));
        assert!(!prompt.matches("kickoff"));
    }

    #[test]
    fn compare_names_ignores_case() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("Work", "personal"), Ordering::Greater);
        assert_ne!(compare_names("work", "Work"), Ordering::Equal);
    }

    #[test]
    fn compare_names_ignores_diacritics() {
        let mut names = vec!["Zebra", "Éclair", "apple"];
        names.sort_by(|a, b| compare_names(a, b));
        assert_eq!(names, ["apple", "Éclair", "Zebra"]);

        assert_eq!(compare_names("Ärger", "Angebot"), Ordering::Greater);
        assert_ne!(compare_names("resume", "résumé"), Ordering::Equal);
    }

    #[test]
    fn normalize_name_rejects_blank() {
        assert_eq!(normalize_name(""), None);
        assert_eq!(normalize_name("   \n"), None);
        assert_eq!(normalize_name("  Work "), Some("Work".to_string()));
    }

    #[test]
    fn preview_uses_first_line() {
        let prompt = Prompt::new("t".into(), "  first  \nsecond".into());
        assert_eq!(prompt.preview(), "first");
        let empty = Prompt::new("t".into(), String::new());
        assert_eq!(empty.preview(), "");
    }
}
