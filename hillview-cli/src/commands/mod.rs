//! CLI command implementations.
//!
//! Each subcommand has its own module with argument definitions and handlers.
//!
//! # Command Modules
//!
//! - [`config`] - Configuration management (get, set, list, path, init)
//! - [`cull`] - One-shot culling of a catalog for a viewport
//! - [`run`] - Main command (serve JSON messages over stdin/stdout)

pub mod config;
pub mod cull;
pub mod run;
