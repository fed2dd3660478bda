//! Password input: files, environment, interactive prompt.

use dialoguer::Password;
use pk_core::{PkError, Result};
use std::fs;
use std::io::IsTerminal;
use std::path::Path;

/// Read a password from a file, dropping the trailing newline an editor or
/// `echo` leaves behind.
pub fn read_password_file(path: &Path) -> std::io::Result<String> {
    let content = fs::read_to_string(path)?;
    Ok(content.trim_end_matches(['\r', '\n']).to_string())
}

/// Hidden interactive prompt. Callers are responsible for invoking this at
/// most once per command run.
pub fn prompt_password(prompt: &str) -> Result<String> {
    Password::new()
        .with_prompt(prompt)
        .interact()
        .map_err(|e| PkError::Other(e.into()))
}

/// Whether an interactive prompt is possible at all.
pub fn stdin_is_interactive() -> bool {
    std::io::stdin().is_terminal()
}
