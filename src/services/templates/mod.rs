//! Prompt Templates
//!
//! ChatML template purposes, built-in defaults and the override store.

pub mod defaults;
pub mod store;

use serde::{Deserialize, Serialize};

pub use store::TemplateStore;

/// What a template is used for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TemplateKind {
    MainChat,
    ProfileCreation,
    CharacterSheet,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 3] = [
        TemplateKind::MainChat,
        TemplateKind::ProfileCreation,
        TemplateKind::CharacterSheet,
    ];
}

impl std::fmt::Display for TemplateKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TemplateKind::MainChat => write!(f, "mainChat"),
            TemplateKind::ProfileCreation => write!(f, "profileCreation"),
            TemplateKind::CharacterSheet => write!(f, "characterSheet"),
        }
    }
}
