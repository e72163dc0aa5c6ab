//! Shared test utilities for dtrocr-core.
//!
//! Tiny configurations that keep every derived view well formed, for tests
//! that build real modules on CPU.

mod tiny_config;

pub use tiny_config::{tiny_dtrocr_config, tiny_text_line_config};
