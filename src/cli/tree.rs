use crate::cli::bar;
use crate::models::Folder;
use colored::Colorize;
use std::io::{self, Write};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const PREVIEW_WIDTH: usize = 48;

/// Cuts `text` to at most `max` terminal columns, ending in "…" when cut
pub fn truncate_to_width(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }

    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

/// Tree lines for `folders`, or for `root` alone when given
pub fn render_tree(folders: &[Folder], root: Option<&Folder>) -> Vec<String> {
    if folders.is_empty() {
        return vec![format!("{}  No folders yet.", bar())];
    }

    let shown: Vec<&Folder> = match root {
        Some(folder) => vec![folder],
        None => folders.iter().collect(),
    };

    let mut lines = Vec::new();
    for folder in shown {
        lines.push(format!(
            "{}  {} {} {}",
            bar(),
            "▸".bright_blue(),
            folder.name.bold(),
            format!("({})", folder.icon_name).bright_black()
        ));

        if folder.prompts.is_empty() {
            lines.push(format!("{}  └── {}", bar(), "empty".bright_black().italic()));
            continue;
        }

        let count = folder.prompts.len();
        for (i, prompt) in folder.prompts.iter().enumerate() {
            let connector = if i == count - 1 { "└──" } else { "├──" };
            lines.push(format!(
                "{}  {} {} {}",
                bar(),
                connector,
                prompt.title.bright_white(),
                truncate_to_width(prompt.preview(), PREVIEW_WIDTH)
                    .bright_black()
                    .italic()
            ));
        }
    }
    lines
}

/// Prints the folder tree
pub fn display_tree(folders: &[Folder], root: Option<&Folder>) {
    for line in render_tree(folders, root) {
        println!("{line}");
    }
}

/// Writes lines with explicit carriage returns, for terminals in raw mode
pub fn print_raw_lines(lines: &[String]) -> io::Result<()> {
    let mut stdout = io::stdout().lock();
    for line in lines {
        write!(stdout, "{line}\r\n")?;
    }
    stdout.flush()
}

pub fn list_all_folders(folders: &[Folder]) {
    if folders.is_empty() {
        println!("{}  No folders yet.", bar());
        return;
    }

    for (idx, folder) in folders.iter().enumerate() {
        let count = match folder.prompts.len() {
            1 => "1 prompt".to_string(),
            n => format!("{n} prompts"),
        };
        println!(
            "{}  {}. {} {}{}",
            bar(),
            (idx + 1).to_string().bright_yellow(),
            folder.name.bright_white().bold(),
            count.bright_black(),
            format!(" [{}]", folder.id).bright_black().italic()
        );
    }
}
