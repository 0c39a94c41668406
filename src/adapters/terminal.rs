//! Colored status tags for operator-facing output.

use colored::Colorize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Info,
    Success,
    Warn,
    Error,
}

/// `message` prefixed with a colored tag such as `[OK]`.
pub fn tagged(tone: Tone, message: &str) -> String {
    let tag = match tone {
        Tone::Info => "[INFO]".blue(),
        Tone::Success => "[OK]".green(),
        Tone::Warn => "[WARN]".yellow(),
        Tone::Error => "[ERROR]".red(),
    };
    format!("{} {}", tag.bold(), message)
}

pub fn heading(title: &str) -> String {
    let rule = "=".repeat(title.chars().count().max(40));
    format!("{rule}\n{}\n{rule}", title.bold())
}
