//! Persona Chat Core
//!
//! Foundational types for the Persona Chat workspace. This crate has zero
//! dependencies on provider or application code (HTTP clients, storage, etc.).
//!
//! ## Module Organization
//!
//! - `error` - Core error types (`CoreError`, `CoreResult`)
//! - `template` - `{path.to.value}` placeholder rendering against a JSON context
//! - `chatml` - `<|im_start|>` / `<|im_end|>` prompt document parsing and validation
//! - `proxy` - Proxy configuration data types shared across workspace crates
//!
//! ## Design Principles
//!
//! 1. **Zero external dependencies beyond serde/thiserror/regex** - keeps build times minimal
//! 2. **Pure string transforms** - rendering and parsing never perform I/O
//! 3. **Unidirectional dependency** - this crate depends on nothing else in the workspace

pub mod chatml;
pub mod error;
pub mod proxy;
pub mod template;

// ── Error Types ────────────────────────────────────────────────────────
pub use error::{CoreError, CoreResult};

// ── ChatML ─────────────────────────────────────────────────────────────
pub use chatml::{
    is_valid_chatml, parse_chatml, parse_chatml_strict, to_chatml, ChatMlMessage, IM_END, IM_START,
};

// ── Templates ──────────────────────────────────────────────────────────
pub use template::{render_serializable, render_template, resolve_path};

// ── Proxy Types ────────────────────────────────────────────────────────
pub use proxy::{ProxyConfig, ProxyProtocol};
