//! Storage Layer
//!
//! Handles settings persistence as a JSON file, with secrets kept in an
//! encrypted side file.

pub mod config;
pub mod secrets;

pub use config::*;
pub use secrets::SecretStore;
