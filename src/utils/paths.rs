//! Cross-Platform Path Utilities
//!
//! Functions for resolving application directories across platforms.

use std::path::{Path, PathBuf};

use crate::utils::error::{AppError, AppResult};

/// Get the user's home directory
pub fn home_dir() -> AppResult<PathBuf> {
    dirs::home_dir().ok_or_else(|| AppError::config("Could not determine home directory"))
}

/// Get the Persona Chat directory (~/.persona-chat/)
pub fn persona_chat_dir() -> AppResult<PathBuf> {
    Ok(home_dir()?.join(".persona-chat"))
}

/// Get the settings file path (~/.persona-chat/settings.json)
pub fn settings_path() -> AppResult<PathBuf> {
    Ok(persona_chat_dir()?.join("settings.json"))
}

/// Ensure a directory exists, creating it if necessary
pub fn ensure_dir(path: &Path) -> AppResult<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Get the Persona Chat directory, creating if it doesn't exist
pub fn ensure_persona_chat_dir() -> AppResult<PathBuf> {
    let path = persona_chat_dir()?;
    ensure_dir(&path)?;
    Ok(path)
}
