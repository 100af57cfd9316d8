//! Keep the user store out of version control.

use std::fs;
use std::path::Path;

use crate::cli::output;

/// Append `entry` to `<project_dir>/.gitignore` unless a line already matches.
///
/// Only acts inside git work trees. Write errors are reported as a warning
/// and otherwise ignored.
pub fn ignore_store_dir(project_dir: &Path, entry: &str) {
    if !project_dir.join(".git").exists() {
        return;
    }

    let gitignore_path = project_dir.join(".gitignore");
    let existing = fs::read_to_string(&gitignore_path).unwrap_or_default();

    let wanted = entry.trim_end_matches('/');
    if existing
        .lines()
        .any(|line| line.trim().trim_end_matches('/') == wanted)
    {
        return;
    }

    let separator = if existing.ends_with('\n') || existing.is_empty() {
        ""
    } else {
        "\n"
    };

    match fs::write(&gitignore_path, format!("{existing}{separator}{entry}\n")) {
        Ok(()) => output::info(&format!("Added '{entry}' to .gitignore")),
        Err(e) => output::warning(&format!("Could not update .gitignore: {e}")),
    }
}
