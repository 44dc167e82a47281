//! CLI command implementations.

pub mod common;
pub mod info;
pub mod presets;
pub mod process;
pub mod scope;
