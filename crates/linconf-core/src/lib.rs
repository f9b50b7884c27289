//! # linconf-core
//!
//! Helpers for configuring Linux hosts from Rust.
//!
//! This crate provides:
//! - Running external commands with captured, leveled log output
//! - Resolving bash commands (`type -t` / `command -v`)
//! - User name and home directory lookup
//! - Restarting the current program, optionally as root
//! - Installing and purging Debian packages with retries
//!
//! ## Platform Support
//!
//! - **Linux**: everything; package management needs `apt-get` and `dpkg`
//! - **macOS** and other Unix systems: everything except package management
//!
//! ## Why unsafe code is needed
//!
//! The passwd lookups and descriptor flag changes go through `libc`. Those
//! calls are wrapped in safe functions.

#![allow(unsafe_code)] // Required for libc passwd and fcntl calls

pub mod bash;
pub mod error;
pub mod meta;
pub mod packages;
pub mod prelude;
pub mod restart;
pub mod shell;
pub mod user;

// Re-export commonly used types
pub use bash::{get_bash_command, BashCommand, BashCommandType};
pub use error::{LinconfError, LinconfResult};
pub use packages::{PackageManager, PackageOptions};
pub use shell::{CommandRunner, ShellCommand, ShellResponse, SystemRunner};
