//! # linconf Utilities
//!
//! Logging setup and logging convenience helpers for linconf.
//!
//! The actual logging engine is `tracing`; this crate only configures the
//! global subscriber and adds a few helpers that reduce boilerplate at call
//! sites (runtime-selected levels, error chains, banners).

pub mod helpers;
pub mod logging;

// Re-export commonly used logging functions for convenience
pub use helpers::{banner, format_error_chain, log_banner, log_error_chain, log_level};
pub use logging::{init_logging, init_logging_with_level, LogFormat, LogGuard, LogLevel, LogSettings, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
