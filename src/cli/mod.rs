//! CLI Module for Prompty
//! Terminal front end over the prompt store, the settings and the hotkey
//! listener. Every command opens the store, does its work and exits.

pub mod commands;
pub mod listen;
pub mod tree;

use crate::clipboard::{OWNER_SERVES_SELECTION, SystemClipboard};
use crate::models::{SettingsStore, StorageManager};
use crate::store::PromptStore;
use colored::{ColoredString, Colorize};
use std::error::Error;

/// Left margin drawn before every output line
pub(crate) fn bar() -> ColoredString {
    "┃".bright_magenta()
}

pub(crate) fn open_store() -> anyhow::Result<PromptStore> {
    Ok(PromptStore::new(
        StorageManager::new()?,
        Box::new(SystemClipboard::new()),
    ))
}

pub(crate) fn open_settings() -> anyhow::Result<SettingsStore> {
    Ok(SettingsStore::load(SettingsStore::default_path()?))
}

/// Splits `--name VALUE` out of `args`
fn take_option(args: &[String], name: &str) -> (Vec<String>, Option<String>) {
    let mut rest = Vec::new();
    let mut value = None;
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == name {
            value = iter.next().cloned();
        } else {
            rest.push(arg.clone());
        }
    }
    (rest, value)
}

/// Splits a boolean `--name` switch out of `args`
fn take_switch(args: &[String], name: &str) -> (Vec<String>, bool) {
    let rest: Vec<String> = args.iter().filter(|a| *a != name).cloned().collect();
    let found = rest.len() != args.len();
    (rest, found)
}

fn usage(message: &str, usage: &str) {
    println!("{}  Error: {}", bar(), message);
    println!("{}  Usage: prompty {}", bar(), usage);
}

/// Executes CLI commands based on the provided arguments
pub fn execute_cli(args: &[String]) -> Result<(), Box<dyn Error>> {
    let Some(command) = args.first() else {
        listen::listen()?;
        return Ok(());
    };
    let rest = &args[1..];

    match command.as_str() {
        "listen" => listen::listen()?,
        "list" | "ls" => commands::list(rest.first().map(String::as_str))?,
        "folders" => commands::folders()?,
        "show" | "cat" => {
            let (rest, folder) = take_option(rest, "--in");
            match rest.first() {
                Some(prompt) => commands::show_prompt(prompt, folder.as_deref())?,
                None => usage("Missing prompt title", "show <PROMPT> [--in FOLDER]"),
            }
        }
        "search" | "find" => {
            let (rest, folder) = take_option(rest, "--in");
            if rest.is_empty() {
                usage("Missing search query", "search <QUERY> [--in FOLDER]");
            } else {
                commands::search(&rest.join(" "), folder.as_deref())?;
            }
        }
        "copy" | "cp" => {
            let (rest, folder) = take_option(rest, "--in");
            match rest.first() {
                Some(prompt) => commands::copy_prompt(prompt, folder.as_deref())?,
                None => usage("Missing prompt title", "copy <PROMPT> [--in FOLDER]"),
            }
        }
        "add-folder" => match rest {
            [name] => commands::add_folder(name, None)?,
            [name, icon] => commands::add_folder(name, Some(icon.as_str()))?,
            _ => usage("Expected a folder name", "add-folder <NAME> [ICON]"),
        },
        "edit-folder" => match rest {
            [folder, name] => commands::edit_folder(folder, name, None)?,
            [folder, name, icon] => commands::edit_folder(folder, name, Some(icon.as_str()))?,
            _ => usage(
                "Expected a folder and a new name",
                "edit-folder <FOLDER> <NAME> [ICON]",
            ),
        },
        "rm-folder" => match rest {
            [folder] => commands::remove_folder(folder)?,
            _ => usage("Expected a folder", "rm-folder <FOLDER>"),
        },
        "add" => match rest {
            [folder, title] => commands::add_prompt(folder, title, None)?,
            [folder, title, content] => commands::add_prompt(folder, title, Some(content.as_str()))?,
            _ => usage(
                "Expected a folder and a title",
                "add <FOLDER> <TITLE> [CONTENT]",
            ),
        },
        "edit" => match rest {
            [folder, prompt, content] => commands::edit_prompt(folder, prompt, content)?,
            _ => usage(
                "Expected a folder, a prompt and the new content",
                "edit <FOLDER> <PROMPT> <CONTENT>",
            ),
        },
        "rename" => match rest {
            [folder, prompt, title] => commands::rename_prompt(folder, prompt, title)?,
            _ => usage(
                "Expected a folder, a prompt and the new title",
                "rename <FOLDER> <PROMPT> <TITLE>",
            ),
        },
        "rm" => match rest {
            [folder, prompt] => commands::remove_prompt(folder, prompt)?,
            _ => usage("Expected a folder and a prompt", "rm <FOLDER> <PROMPT>"),
        },
        "export" => match rest {
            [path] => commands::export(path)?,
            _ => usage("Missing export path", "export <PATH>"),
        },
        "import" => {
            let (rest, overwrite) = take_switch(rest, "--overwrite");
            match rest.as_slice() {
                [path] => commands::import(path, overwrite)?,
                _ => usage("Missing import path", "import <PATH> [--overwrite]"),
            }
        }
        "settings" => match rest {
            [] => commands::show_settings()?,
            [key, value] => commands::change_setting(key, value)?,
            _ => usage("Expected a key and a value", "settings [KEY VALUE]"),
        },
        "hotkey" => commands::show_hot_key()?,
        "help" | "-h" | "--help" => print_help(),
        _ => {
            println!("{}  Unknown command: {}", bar(), command);

            print_help();
        }
    }

    Ok(())
}

/// Prints the help message with available commands
fn print_help() {
    println!("{}  {}", bar(), "PROMPTY - PROMPT LAUNCHER".bold());

    println!("{}  {}", bar(), "USAGE:".bright_yellow());
    println!("{}  prompty [COMMAND] [ARGS]", bar());
    println!("{}  {}", bar(), "COMMANDS:".bright_yellow());

    let commands = [
        ("listen", "Wait for the global hotkey (default)"),
        ("list, ls [FOLDER]", "List folders and prompts in tree format"),
        ("folders", "List all folders with their IDs"),
        ("show, cat <PROMPT>", "Print a prompt (partial title works)"),
        ("search, find <QUERY>", "Search folder names, titles and content"),
        ("copy, cp <PROMPT>", "Copy a prompt to the clipboard"),
        ("add-folder <NAME> [ICON]", "Create a folder"),
        ("edit-folder <F> <NAME> [ICON]", "Rename a folder or change its icon"),
        ("rm-folder <FOLDER>", "Delete a folder and its prompts"),
        ("add <F> <TITLE> [CONTENT]", "Add a prompt (content from stdin if omitted)"),
        ("edit <F> <PROMPT> <CONTENT>", "Replace a prompt's content"),
        ("rename <F> <PROMPT> <TITLE>", "Rename a prompt"),
        ("rm <FOLDER> <PROMPT>", "Delete a prompt"),
        ("export <PATH>", "Export to JSON, or YAML for .yaml/.yml"),
        ("import <PATH> [--overwrite]", "Merge prompts from an export"),
        ("settings [KEY VALUE]", "Show or change a setting"),
        ("hotkey", "Show the active hotkey and presets"),
        ("help", "Display this help message"),
    ];
    for (command, description) in commands {
        println!(
            "{}  {:<31} {}",
            bar(),
            command.bright_white(),
            description
        );
    }

    println!("{}  {}", bar(), "TIP:".bright_green());
    println!(
        "{}  show, search and copy accept --in <FOLDER> to narrow the lookup",
        bar()
    );
    if OWNER_SERVES_SELECTION {
        println!(
            "{}  On X11 copied text lasts only while prompty runs, so copy waits for Enter",
            bar()
        );
    }
}
