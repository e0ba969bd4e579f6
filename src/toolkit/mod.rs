//! Audio toolkit interfaces and implementations
//!
//! This module provides:
//! - `AudioToolkit` trait for everything that touches audio data
//! - A SoX-backed implementation driven through subprocesses
//! - A fake toolkit for exercising the pipeline without SoX

mod capability;
mod fake;
mod runner;
mod sox;

pub use capability::{query_supported_formats, AudioToolkit, FALLBACK_FORMATS};
pub use fake::{FakeToolkit, ToolkitCall};
pub use runner::{CommandOutput, CommandRunner};
pub use sox::{SoxToolkit, DEFAULT_TOOL_TIMEOUT_SECS};
