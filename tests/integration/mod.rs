//! Integration Tests Module
//!
//! Integration tests for the persona chat backend. Tests cover prompt
//! compilation with built-in and overridden templates, and generation through
//! every provider adapter against a local mock server.

// One-shot HTTP server shared by the provider tests
mod mock_server;

// Prompt compilation through the public API
mod prompt_builder_test;

// Generation manager end to end
mod generation_test;

// Settings persistence feeding the generation manager
mod settings_flow_test;
