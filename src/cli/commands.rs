use crate::cli::{bar, open_settings, open_store, tree};
use crate::clipboard::{OWNER_SERVES_SELECTION, must_hold_after_copy};
use crate::hotkey::HotKeyPreset;
use crate::models::{FontToken, Folder, Prompt, export_collection, import_collection};
use crate::search::search_all;
use crate::store::PromptStore;
use anyhow::{Context, Result};
use colored::Colorize;
use crossterm::tty::IsTty;
use std::io::{self, Read};
use std::path::Path;
use uuid::Uuid;

/// Resolves a folder by id or name, printing the known folders on a miss
fn resolve_folder(store: &PromptStore, name_or_id: &str) -> Option<Uuid> {
    let found = match Uuid::parse_str(name_or_id) {
        Ok(id) => store.folder(id).map(|f| f.id),
        Err(_) => store.find_folder_by_name(name_or_id).map(|f| f.id),
    };

    if found.is_none() {
        println!("{}  No folder found with name: {}", bar(), name_or_id);
        tree::list_all_folders(store.folders());
    }
    found
}

/// Finds a prompt by id or title, inside `folder` when given.
/// Exact title matches win over partial ones across all folders.
fn resolve_prompt<'a>(
    store: &'a PromptStore,
    name_or_id: &str,
    folder: Option<Uuid>,
) -> Option<(&'a Folder, &'a Prompt)> {
    let folders: Vec<&Folder> = match folder {
        Some(id) => store.folder(id).into_iter().collect(),
        None => store.folders().iter().collect(),
    };

    if let Ok(id) = Uuid::parse_str(name_or_id) {
        return folders
            .iter()
            .find_map(|f| f.prompt(id).map(|p| (*f, p)));
    }

    let needle = name_or_id.trim().to_lowercase();
    if needle.is_empty() {
        return None;
    }

    let exact = folders.iter().find_map(|f| {
        f.prompts
            .iter()
            .find(|p| p.title.to_lowercase() == needle)
            .map(|p| (*f, p))
    });
    exact.or_else(|| {
        folders
            .iter()
            .find_map(|f| store.find_prompt(f.id, &needle).map(|p| (*f, p)))
    })
}

fn no_prompt(name: &str) {
    println!("{}  No prompt found with title: {}", bar(), name);
}

fn nothing_changed() {
    println!("{}  Nothing changed.", bar());
}

pub fn list(folder: Option<&str>) -> Result<()> {
    let store = open_store()?;

    let Some(name) = folder else {
        tree::display_tree(store.folders(), None);
        return Ok(());
    };

    if let Some(id) = resolve_folder(&store, name) {
        tree::display_tree(store.folders(), store.folder(id));
    }
    Ok(())
}

pub fn folders() -> Result<()> {
    let store = open_store()?;
    tree::list_all_folders(store.folders());
    Ok(())
}

pub fn show_prompt(name_or_id: &str, folder: Option<&str>) -> Result<()> {
    let store = open_store()?;
    let folder_id = match folder {
        Some(name) => match resolve_folder(&store, name) {
            Some(id) => Some(id),
            None => return Ok(()),
        },
        None => None,
    };

    match resolve_prompt(&store, name_or_id, folder_id) {
        Some((folder, prompt)) => display_prompt(folder, prompt),
        None => no_prompt(name_or_id),
    }
    Ok(())
}

fn display_prompt(folder: &Folder, prompt: &Prompt) {
    println!(
        "{}  {} {}",
        bar(),
        "PROMPT".bright_green().bold(),
        prompt.title.bold()
    );
    println!("{}", "─".repeat(60).bright_magenta());
    println!("{}  {}: {}", bar(), "Folder".bright_blue(), folder.name);
    println!(
        "{}  {}: {}",
        bar(),
        "Updated".bright_yellow(),
        prompt.updated_at.format("%Y-%m-%d %H:%M")
    );
    println!("{}  {}: {}", bar(), "ID".bright_black(), prompt.id);
    println!("{}", "─".repeat(60).bright_magenta());

    for line in prompt.content.lines() {
        println!("{}  {}", bar(), line);
    }
}

/// Folder-name matches, then prompt matches
pub fn search(query: &str, folder: Option<&str>) -> Result<()> {
    let mut store = open_store()?;
    store.set_search_query(query);

    println!(
        "{}  {} '{}'",
        bar(),
        "SEARCH RESULTS FOR".bold(),
        query.bright_white()
    );

    if let Some(name) = folder {
        let Some(id) = resolve_folder(&store, name) else {
            return Ok(());
        };
        store.select_folder(Some(id));
        let hits = store.filtered_prompts(id, query);
        if hits.is_empty() {
            println!("{}  No prompts found matching query: {}", bar(), query);
        }
        for (idx, prompt) in hits.iter().enumerate() {
            print_hit(idx, prompt, None);
        }
        return Ok(());
    }

    let folder_hits = store.filtered_folders(store.search_query());
    let prompt_hits = search_all(store.folders(), store.search_query());

    if folder_hits.is_empty() && prompt_hits.is_empty() {
        println!("{}  Nothing found matching query: {}", bar(), query);
        return Ok(());
    }

    for folder in &folder_hits {
        println!(
            "{}  {} {} {}",
            bar(),
            "▸".bright_blue(),
            folder.name.bold(),
            "(folder)".bright_black()
        );
    }
    for (idx, hit) in prompt_hits.iter().enumerate() {
        print_hit(idx, hit.prompt, Some(hit.folder));
    }
    Ok(())
}

fn print_hit(idx: usize, prompt: &Prompt, folder: Option<&Folder>) {
    println!(
        "{}  {}. {}",
        bar(),
        (idx + 1).to_string().bright_yellow(),
        prompt.title.bright_white().bold()
    );
    if let Some(folder) = folder {
        println!("{}     {}: {}", bar(), "Folder".bright_blue(), folder.name);
    }
    println!(
        "{}     {}: {}",
        bar(),
        "Preview".bright_green(),
        tree::truncate_to_width(prompt.preview(), 56)
    );
}

pub fn copy_prompt(name_or_id: &str, folder: Option<&str>) -> Result<()> {
    let mut store = open_store()?;
    let folder_id = match folder {
        Some(name) => match resolve_folder(&store, name) {
            Some(id) => Some(id),
            None => return Ok(()),
        },
        None => None,
    };

    let Some((_, prompt)) = resolve_prompt(&store, name_or_id, folder_id) else {
        no_prompt(name_or_id);
        return Ok(());
    };
    let prompt = prompt.clone();

    if store.copy_prompt(&prompt) {
        println!(
            "{}  {} {}",
            bar(),
            "Copied".bright_green(),
            prompt.title.bold()
        );
        if must_hold_after_copy(OWNER_SERVES_SELECTION, io::stdin().is_tty()) {
            // The store keeps the clipboard context, and with it the
            // selection, alive until it is dropped.
            println!(
                "{}  Paste it now, then press Enter to release the clipboard.",
                bar()
            );
            io::stdin()
                .read_line(&mut String::new())
                .context("Failed to read from stdin")?;
        }
    } else {
        println!("{}  Could not write to the clipboard.", bar());
    }
    Ok(())
}

pub fn add_folder(name: &str, icon: Option<&str>) -> Result<()> {
    let mut store = open_store()?;
    match store.add_folder(name, icon) {
        Some(id) => println!("{}  Added folder {} [{}]", bar(), name.trim().bold(), id),
        None => nothing_changed(),
    }
    Ok(())
}

pub fn edit_folder(folder: &str, name: &str, icon: Option<&str>) -> Result<()> {
    let mut store = open_store()?;
    let Some(id) = resolve_folder(&store, folder) else {
        return Ok(());
    };

    let changed = match icon {
        Some(icon) => store.update_folder(id, name, icon),
        None => store.rename_folder(id, name),
    };
    if changed {
        println!("{}  Updated folder {}", bar(), name.trim().bold());
    } else {
        nothing_changed();
    }
    Ok(())
}

pub fn remove_folder(folder: &str) -> Result<()> {
    let mut store = open_store()?;
    let Some(id) = resolve_folder(&store, folder) else {
        return Ok(());
    };

    let name = store.folder(id).map(|f| f.name.clone()).unwrap_or_default();
    if store.delete_folder(id) {
        println!("{}  Deleted folder {}", bar(), name.bold());
    }
    Ok(())
}

pub fn add_prompt(folder: &str, title: &str, content: Option<&str>) -> Result<()> {
    let mut store = open_store()?;
    let Some(folder_id) = resolve_folder(&store, folder) else {
        return Ok(());
    };

    let content = match content {
        Some(content) => content.to_string(),
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read prompt content from stdin")?;
            buf.trim_end_matches('\n').to_string()
        }
    };

    match store.add_prompt(folder_id, title, &content) {
        Some(id) => println!("{}  Added prompt {} [{}]", bar(), title.trim().bold(), id),
        None => nothing_changed(),
    }
    Ok(())
}

pub fn edit_prompt(folder: &str, prompt: &str, content: &str) -> Result<()> {
    let mut store = open_store()?;
    let Some(folder_id) = resolve_folder(&store, folder) else {
        return Ok(());
    };
    let Some((_, found)) = resolve_prompt(&store, prompt, Some(folder_id)) else {
        no_prompt(prompt);
        return Ok(());
    };
    let (prompt_id, title) = (found.id, found.title.clone());

    if store.update_prompt(folder_id, prompt_id, &title, content) {
        println!("{}  Updated prompt {}", bar(), title.bold());
    } else {
        nothing_changed();
    }
    Ok(())
}

pub fn rename_prompt(folder: &str, prompt: &str, title: &str) -> Result<()> {
    let mut store = open_store()?;
    let Some(folder_id) = resolve_folder(&store, folder) else {
        return Ok(());
    };
    let Some(prompt_id) = resolve_prompt(&store, prompt, Some(folder_id)).map(|(_, p)| p.id) else {
        no_prompt(prompt);
        return Ok(());
    };

    if store.rename_prompt(folder_id, prompt_id, title) {
        println!("{}  Renamed prompt to {}", bar(), title.trim().bold());
    } else {
        nothing_changed();
    }
    Ok(())
}

pub fn remove_prompt(folder: &str, prompt: &str) -> Result<()> {
    let mut store = open_store()?;
    let Some(folder_id) = resolve_folder(&store, folder) else {
        return Ok(());
    };
    let Some((prompt_id, title)) =
        resolve_prompt(&store, prompt, Some(folder_id)).map(|(_, p)| (p.id, p.title.clone()))
    else {
        no_prompt(prompt);
        return Ok(());
    };

    if store.delete_prompt(folder_id, prompt_id) {
        println!("{}  Deleted prompt {}", bar(), title.bold());
    }
    Ok(())
}

pub fn export(path: &str) -> Result<()> {
    let store = open_store()?;
    export_collection(store.folders(), Path::new(path))?;
    println!(
        "{}  Exported {} folders to {}",
        bar(),
        store.folders().len(),
        path.bright_white()
    );
    Ok(())
}

pub fn import(path: &str, overwrite: bool) -> Result<()> {
    let mut store = open_store()?;
    let folders = import_collection(Path::new(path))?;

    let summary = store.import(folders, overwrite);
    if summary.is_empty() {
        nothing_changed();
        return Ok(());
    }
    println!(
        "{}  Imported {} new folders and {} new prompts",
        bar(),
        summary.folders_added,
        summary.prompts_added
    );
    if overwrite {
        println!(
            "{}  Overwrote {} folders and {} prompts",
            bar(),
            summary.folders_updated,
            summary.prompts_updated
        );
    }
    Ok(())
}

pub fn show_settings() -> Result<()> {
    let settings_store = open_settings()?;
    let settings = settings_store.settings();

    println!("{}  {}", bar(), "SETTINGS".bold());
    println!(
        "{}  {}",
        bar(),
        settings_store.path().display().to_string().bright_black()
    );
    println!("{}", "─".repeat(60).bright_magenta());

    let rows = [
        ("hotKeyMode", settings.hot_key_mode.to_string()),
        ("hotKeyPreset", settings.hot_key_preset.key().to_string()),
        ("customHotKey", settings.custom_hot_key().to_string()),
        ("appearance", settings.appearance.to_string()),
        ("windowOpacity", format!("{:.2}", settings.window_opacity)),
        ("fontStyle", settings.font_style.to_string()),
        ("fontSize", format!("{}", settings.font_size)),
    ];
    for (key, value) in rows {
        println!("{}  {:<15} {}", bar(), key.bright_white(), value);
    }

    let face = settings
        .font_style
        .font_name(false)
        .unwrap_or("system default");
    let sizes = [
        FontToken::Title,
        FontToken::Subtitle,
        FontToken::Body,
        FontToken::Small,
        FontToken::Badge,
    ]
    .map(|token| format!("{token:?} {}", settings_store.font_size_for(token)))
    .join(", ");
    println!("{}  {:<15} {} ({})", bar(), "font".bright_black(), face, sizes);
    Ok(())
}

pub fn change_setting(key: &str, value: &str) -> Result<()> {
    let mut settings = open_settings()?;
    settings.set_by_key(key, value)?;
    println!("{}  {} = {}", bar(), key.bright_white(), value);
    Ok(())
}

pub fn show_hot_key() -> Result<()> {
    let settings = open_settings()?;
    let active = settings.resolved_hot_key();

    println!(
        "{}  {} {} ({})",
        bar(),
        "HOTKEY".bold(),
        active.to_string().bright_green(),
        settings.settings().hot_key_mode
    );
    println!("{}  {}", bar(), "PRESETS:".bright_yellow());
    for preset in HotKeyPreset::ALL {
        let marker = if preset.hot_key() == active { "●" } else { " " };
        println!(
            "{}  {} {:<20} {}",
            bar(),
            marker.bright_green(),
            preset.key().bright_white(),
            preset
        );
    }
    Ok(())
}
