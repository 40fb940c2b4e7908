//! Persona Model
//!
//! The user's own identity as presented to characters.

use serde::{Deserialize, Serialize};

/// Who the user is in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Persona {
    #[serde(default = "default_persona_name")]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

fn default_persona_name() -> String {
    "User".to_string()
}

impl Persona {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    /// Name to show in prompts, never blank.
    pub fn display_name(&self) -> &str {
        let name = self.name.trim();
        if name.is_empty() {
            "User"
        } else {
            name
        }
    }
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            name: default_persona_name(),
            description: String::new(),
        }
    }
}
