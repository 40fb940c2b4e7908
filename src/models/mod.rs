//! Data Models
//!
//! Contains all data structures used throughout the application.

pub mod character;
pub mod history;
pub mod persona;
pub mod settings;

pub use character::*;
pub use history::*;
pub use persona::*;
pub use settings::*;
