//! Example demonstrating how to use linconf-utils logging
//!
//! 1. Initialize from environment variables (recommended)
//! 2. Log at a level chosen at runtime
//! 3. Log an error together with its causes
//! 4. Make a message stand out with a banner

use std::io;

use linconf_utils::{init_logging, log_banner, log_error_chain, log_level, LogLevel};

fn main()
{
    // Set RUST_LOG=debug to see debug messages
    // Set LINCONF_LOG_FORMAT=json for JSON output
    let _guard = init_logging().expect("Failed to initialize logging");

    log_banner(Some(LogLevel::Info), "linconf logging demo\nbanners keep explicit line breaks");

    for (level, message) in [
        (Some(LogLevel::Warn), "This is a warning message"),
        (Some(LogLevel::Debug), "This is a debug message (set RUST_LOG=debug to see)"),
        (None, "This message is silenced"),
    ] {
        log_level(level, message);
    }

    // Structured logging with fields
    tracing::info!(package = "dialog", action = "install", "Package installed");

    // Using spans for context
    let span = tracing::span!(tracing::Level::INFO, "install", package = "dialog");
    let _entered = span.enter();
    tracing::info!("Running apt-get");
    drop(_entered);

    let err = io::Error::new(io::ErrorKind::PermissionDenied, "could not open lock file");
    log_error_chain("demo", &err);
}
